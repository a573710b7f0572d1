//! Voice conversion task endpoints – async task pattern.
//!
//! `POST /v1/tts` accepts a synthesis parameter bundle and returns a task id
//! immediately; the conversion runs on a background worker.  Status is polled
//! via `GET /v1/tts/{id}`, the artifact is streamed from
//! `GET /v1/tts/{id}/result` once the task completes, and `DELETE /v1/tts/{id}`
//! removes the task together with its working directory.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio_util::io::ReaderStream;
use tracing::debug;
use utoipa::OpenApi;

use revoice_core::{ConversionRequest, TaskId};

use crate::error::ServerError;
use crate::schemas::v1::tts::{
    DeleteResponse, TaskCreatedResponse, TaskRecordExt, TaskStatusResponse,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_task, get_task_status, get_task_result, delete_task),
    components(schemas(TaskCreatedResponse, TaskStatusResponse, DeleteResponse))
)]
pub struct TtsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tts", post(create_task))
        .route("/tts/{id}", get(get_task_status).delete(delete_task))
        .route("/tts/{id}/result", get(get_task_result))
}

/// Submit a conversion task (`POST /v1/tts`).
///
/// Returns `{id, status, created_at}` immediately; the conversion itself runs
/// in the background.  Poll `GET /v1/tts/{id}` for progress.
#[utoipa::path(
    post,
    path = "/v1/tts",
    tag = "tts",
    request_body(content = serde_json::Value, description = "Synthesis parameters; only `text` is required"),
    responses(
        (status = 200, description = "Task accepted", body = TaskCreatedResponse),
        (status = 400, description = "Bad request"),
    )
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConversionRequest>,
) -> Result<Json<TaskCreatedResponse>, ServerError> {
    if request.text.trim().is_empty() {
        return Err(ServerError::BadRequest("text must not be empty".into()));
    }
    debug!(text_len = request.text.len(), voice = %request.voice, "conversion request");

    let record = state.tasks.submit(request).await;
    Ok(Json(record.to_created()))
}

/// Current status of a task (`GET /v1/tts/{id}`).
#[utoipa::path(
    get,
    path = "/v1/tts/{id}",
    tag = "tts",
    params(
        ("id" = uuid::Uuid, Path, description = "Task id")
    ),
    responses(
        (status = 200, description = "Task status", body = TaskStatusResponse),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn get_task_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskStatusResponse>, ServerError> {
    let record = state.tasks.status(id).await?;
    Ok(Json(record.to_status()))
}

/// Stream the converted audio of a completed task (`GET /v1/tts/{id}/result`).
///
/// Read-only: fetching a result any number of times leaves the task record
/// untouched.
#[utoipa::path(
    get,
    path = "/v1/tts/{id}/result",
    tag = "tts",
    params(
        ("id" = uuid::Uuid, Path, description = "Task id")
    ),
    responses(
        (status = 200, description = "Audio artifact", body = Vec<u8>, content_type = "audio/wav"),
        (status = 400, description = "Task is not completed yet"),
        (status = 404, description = "Task or artifact not found"),
    )
)]
pub async fn get_task_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TaskId>,
) -> Result<Response, ServerError> {
    let result = state.tasks.open_result(id).await?;

    let extension = result
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let filename = result
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{id}.bin"));

    let stream = ReaderStream::new(result.file);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&extension))
        .header(header::CONTENT_LENGTH, result.len.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

/// Delete a task and its working directory (`DELETE /v1/tts/{id}`).
///
/// Allowed in any status; deleting a task whose worker is still running
/// abandons that conversion's outcome.
#[utoipa::path(
    delete,
    path = "/v1/tts/{id}",
    tag = "tts",
    params(
        ("id" = uuid::Uuid, Path, description = "Task id")
    ),
    responses(
        (status = 200, description = "Task deleted", body = DeleteResponse),
        (status = 404, description = "Task not found"),
    )
)]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TaskId>,
) -> Result<Json<DeleteResponse>, ServerError> {
    state.tasks.delete(id).await?;
    Ok(Json(DeleteResponse {
        message: format!("task {id} deleted"),
    }))
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::response::IntoResponse;
    use revoice_core::{
        ConversionEngine, ConversionOutput, ConversionPaths, EngineError, Orchestrator, TaskStore,
    };

    use crate::config::Config;

    /// Writes a tiny artifact and succeeds.
    struct StubEngine;

    #[async_trait]
    impl ConversionEngine for StubEngine {
        async fn convert(
            &self,
            _request: &ConversionRequest,
            paths: &ConversionPaths,
        ) -> Result<ConversionOutput, EngineError> {
            tokio::fs::write(&paths.output_file, b"stub audio")
                .await
                .map_err(|e| EngineError::Conversion(e.to_string()))?;
            Ok(ConversionOutput {
                message: "ok".to_owned(),
                output_file: paths.output_file.clone(),
            })
        }
    }

    fn test_state(work_root: &std::path::Path) -> Arc<AppState> {
        let config = Config {
            bind_address: "127.0.0.1:0".into(),
            work_dir: work_root.to_string_lossy().into_owned(),
            converter_cmd: "rvc".into(),
            sweep_interval_secs: 3600,
            retention_hours: 24,
            log_level: "info".into(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: false,
        };
        Arc::new(AppState {
            config: Arc::new(config),
            tasks: Arc::new(Orchestrator::new(
                TaskStore::new(),
                Arc::new(StubEngine),
                work_root,
            )),
        })
    }

    async fn wait_for_terminal(state: &Arc<AppState>, id: TaskId) {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Ok(record) = state.tasks.status(id).await {
                    if record.status.is_terminal() {
                        break;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("task should complete within timeout");
    }

    #[tokio::test]
    async fn create_then_status_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let Json(created) = create_task(
            State(Arc::clone(&state)),
            Json(ConversionRequest::for_text("bonjour")),
        )
        .await
        .expect("create should succeed");
        assert_eq!(created.status, "pending");

        let id: TaskId = created.id.parse().unwrap();
        wait_for_terminal(&state, id).await;

        let Json(status) = get_task_status(State(Arc::clone(&state)), Path(id))
            .await
            .expect("status should succeed");
        assert_eq!(status.status, "completed");
        assert!(status.output_file.is_some());
        assert!(status.completed_at.is_some());

        let Json(deleted) = delete_task(State(Arc::clone(&state)), Path(id))
            .await
            .expect("delete should succeed");
        assert!(deleted.message.contains(&id.to_string()));

        let err = get_task_status(State(state), Path(id)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_rejects_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let err = create_task(
            State(state),
            Json(ConversionRequest::for_text("   ")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn result_streams_with_audio_headers() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let Json(created) = create_task(
            State(Arc::clone(&state)),
            Json(ConversionRequest::for_text("stream me")),
        )
        .await
        .unwrap();
        let id: TaskId = created.id.parse().unwrap();
        wait_for_terminal(&state, id).await;

        let response = get_task_result(State(state), Path(id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE.as_str()], "audio/wav");
        assert_eq!(
            headers[header::CONTENT_LENGTH.as_str()],
            b"stub audio".len().to_string().as_str()
        );
    }

    #[tokio::test]
    async fn result_before_completion_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        // Insert directly so the record stays Pending.
        let record = state
            .tasks
            .store()
            .create(Arc::new(ConversionRequest::for_text("early")))
            .await;

        let err = get_task_result(State(state), Path(record.id))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn content_types_cover_common_formats() {
        assert_eq!(content_type_for("wav"), "audio/wav");
        assert_eq!(content_type_for("mp3"), "audio/mpeg");
        assert_eq!(content_type_for("weird"), "application/octet-stream");
    }
}
