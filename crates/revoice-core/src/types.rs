use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a submitted conversion task.
pub type TaskId = Uuid;

/// High-level lifecycle state of a conversion task.
///
/// Transitions are one-directional:
/// `Pending → Processing → {Completed | Failed}`.  Nothing ever leaves a
/// terminal state; [`crate::store::TaskStore`] enforces this on every
/// transition helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task has been accepted but its worker has not started yet.
    Pending,
    /// The worker is running the conversion engine.
    Processing,
    /// Conversion finished; the artifact is available.
    Completed,
    /// Conversion failed; the error message is recorded.
    Failed,
}

impl TaskStatus {
    /// Returns `true` once the task has reached `Completed` or `Failed`.
    ///
    /// Callers polling until a task is done should use this rather than
    /// matching individual variants.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full synthesis parameter bundle supplied at submission.
///
/// The orchestration layer treats this as opaque and passes it to the
/// conversion engine verbatim; the only field it reads itself is
/// [`export_format`](Self::export_format), which names the output file.
/// Defaults match the converter's documented defaults so that a request
/// containing only `text` is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Text to synthesize and convert.
    pub text: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    /// TTS speaking-rate adjustment in percent.
    #[serde(default)]
    pub rate: i32,
    /// Pitch shift in semitones applied by the voice conversion.
    #[serde(default)]
    pub pitch: i32,
    #[serde(default = "default_filter_radius")]
    pub filter_radius: u32,
    #[serde(default = "default_index_rate")]
    pub index_rate: f32,
    #[serde(default = "default_volume_envelope")]
    pub volume_envelope: f32,
    #[serde(default = "default_protect")]
    pub protect: f32,
    #[serde(default = "default_hop_length")]
    pub hop_length: u32,
    #[serde(default = "default_f0_method")]
    pub f0_method: String,
    /// Path to the voice model weights.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Path to the retrieval index accompanying the model.
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default)]
    pub split_audio: bool,
    #[serde(default)]
    pub autotune: bool,
    #[serde(default = "default_autotune_strength")]
    pub autotune_strength: f32,
    #[serde(default = "default_clean_audio")]
    pub clean_audio: bool,
    #[serde(default = "default_clean_strength")]
    pub clean_strength: f32,
    /// Container format of the final artifact, e.g. `"wav"` or `"flac"`.
    #[serde(default = "default_export_format")]
    pub export_format: String,
    #[serde(default = "default_embedder_model")]
    pub embedder_model: String,
}

impl ConversionRequest {
    /// A request for `text` with every other parameter at its default.
    pub fn for_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: default_voice(),
            rate: 0,
            pitch: 0,
            filter_radius: default_filter_radius(),
            index_rate: default_index_rate(),
            volume_envelope: default_volume_envelope(),
            protect: default_protect(),
            hop_length: default_hop_length(),
            f0_method: default_f0_method(),
            model_path: default_model_path(),
            index_path: default_index_path(),
            split_audio: false,
            autotune: false,
            autotune_strength: default_autotune_strength(),
            clean_audio: default_clean_audio(),
            clean_strength: default_clean_strength(),
            export_format: default_export_format(),
            embedder_model: default_embedder_model(),
        }
    }
}

fn default_voice() -> String {
    "fr-FR-HenriNeural".to_owned()
}
fn default_filter_radius() -> u32 {
    3
}
fn default_index_rate() -> f32 {
    0.75
}
fn default_volume_envelope() -> f32 {
    1.0
}
fn default_protect() -> f32 {
    0.5
}
fn default_hop_length() -> u32 {
    128
}
fn default_f0_method() -> String {
    "rmvpe".to_owned()
}
fn default_model_path() -> String {
    "logs/model/model.pth".to_owned()
}
fn default_index_path() -> String {
    "logs/metadata/metadata.index".to_owned()
}
fn default_autotune_strength() -> f32 {
    1.0
}
fn default_clean_audio() -> bool {
    true
}
fn default_clean_strength() -> f32 {
    0.5
}
fn default_export_format() -> String {
    "wav".to_owned()
}
fn default_embedder_model() -> String {
    "contentvec".to_owned()
}

/// Errors surfaced to callers of the task API.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// The referenced task does not exist (or no longer exists).
    #[error("task not found: {task_id}")]
    NotFound { task_id: TaskId },

    /// The operation requires the task to be in a different state.
    #[error("task {task_id} is not completed (status: {status})")]
    InvalidState { task_id: TaskId, status: TaskStatus },

    /// The task completed but its artifact is gone from disk.
    #[error("output file for task {task_id} is missing: {path}")]
    MissingArtifact { task_id: TaskId, path: String },
}

/// Errors produced by the conversion engine.
///
/// These never cross the worker boundary as errors; the worker folds them
/// into the task record as a `Failed` outcome.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The converter executable could not be launched at all.
    #[error("failed to launch converter: {0}")]
    Spawn(String),

    /// The converter ran and reported a failure.  The message is stored on
    /// the task record verbatim.
    #[error("{0}")]
    Conversion(String),

    /// The converter exited successfully but the expected artifact is absent.
    #[error("converter produced no output file at {0}")]
    MissingOutput(String),
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let s = serde_json::to_string(&TaskStatus::Processing).unwrap();
        assert_eq!(s, "\"processing\"");
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Processing.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn request_defaults_apply_to_minimal_body() {
        let req: ConversionRequest =
            serde_json::from_str(r#"{"text": "bonjour"}"#).unwrap();
        assert_eq!(req.text, "bonjour");
        assert_eq!(req.voice, "fr-FR-HenriNeural");
        assert_eq!(req.f0_method, "rmvpe");
        assert_eq!(req.export_format, "wav");
        assert!(req.clean_audio);
        assert!(!req.split_audio);
    }
}
