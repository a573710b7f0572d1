use serde::Serialize;
use utoipa::ToSchema;

use revoice_core::TaskRecord;

/// Response to a successful task submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskCreatedResponse {
    pub id: String,
    pub status: String,
    pub created_at: String,
}

/// Full task status view.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskStatusResponse {
    pub id: String,
    pub status: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Acknowledgement for a task deletion.
#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

pub trait TaskRecordExt {
    fn to_created(&self) -> TaskCreatedResponse;
    fn to_status(&self) -> TaskStatusResponse;
}

impl TaskRecordExt for TaskRecord {
    fn to_created(&self) -> TaskCreatedResponse {
        TaskCreatedResponse {
            id: self.id.to_string(),
            status: self.status.as_str().to_owned(),
            created_at: self.created_at.to_rfc3339(),
        }
    }

    fn to_status(&self) -> TaskStatusResponse {
        TaskStatusResponse {
            id: self.id.to_string(),
            status: self.status.as_str().to_owned(),
            created_at: self.created_at.to_rfc3339(),
            completed_at: self.completed_at.map(|t| t.to_rfc3339()),
            output_file: self
                .output_file
                .as_ref()
                .map(|p| p.display().to_string()),
            error: self.error.clone(),
        }
    }
}
