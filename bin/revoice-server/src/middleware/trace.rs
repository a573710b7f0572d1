//! Per-request tracing middleware.
//!
//! Assigns (or propagates) a request id, wraps the request in a span and
//! logs method, path, status and latency on completion.

use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub static X_REQUEST_ID: &str = "x-request-id";

pub async fn trace_middleware(mut req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    async move {
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            req.headers_mut().insert(X_REQUEST_ID, value);
        }

        let mut response = next.run(req).await;

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }

        info!(
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "request finished"
        );

        response
    }
    .instrument(span)
    .await
}
