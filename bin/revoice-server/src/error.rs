//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! Internal errors are logged with full detail but only a generic message is
//! returned to the caller, so filesystem paths and other implementation
//! details never leak to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use revoice_core::TaskError;

/// All errors that can occur in the revoice-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the orchestration core.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::Task(e) => match e {
                TaskError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
                TaskError::InvalidState { .. } => (StatusCode::BAD_REQUEST, e.to_string()),
                TaskError::MissingArtifact { task_id, path } => {
                    // Log the path, return a message without it.
                    error!(task_id = %task_id, path = %path, "task artifact missing from disk");
                    (
                        StatusCode::NOT_FOUND,
                        format!("output file for task {task_id} not found"),
                    )
                }
            },
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use revoice_core::TaskStatus;

    #[test]
    fn task_errors_map_to_expected_status_codes() {
        let id = uuid::Uuid::new_v4();
        let cases = [
            (
                ServerError::Task(TaskError::NotFound { task_id: id }),
                StatusCode::NOT_FOUND,
            ),
            (
                ServerError::Task(TaskError::InvalidState {
                    task_id: id,
                    status: TaskStatus::Processing,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Task(TaskError::MissingArtifact {
                    task_id: id,
                    path: "/gone".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ServerError::BadRequest("nope".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
