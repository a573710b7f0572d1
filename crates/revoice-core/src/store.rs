//! In-memory task record store.
//!
//! [`TaskStore`] is the single source of truth for task state.  It owns every
//! [`TaskRecord`]; workers hold only a task id and mutate records through the
//! store's update helpers, never through a private copy.
//!
//! Uses a `tokio::sync::RwLock<HashMap>` so many readers can observe task
//! state concurrently while writers apply one mutation at a time.  The store
//! handle is cheap to clone and shared between the HTTP layer, the workers
//! and the expiry sweeper.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{ConversionRequest, TaskError, TaskId, TaskStatus};

/// The complete in-memory record for a single submitted conversion task.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Set at creation, immutable afterwards.
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the task reaches a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// The submission parameters, passed through to the engine verbatim.
    pub request: Arc<ConversionRequest>,
    /// Path to the artifact; present if and only if `status == Completed`.
    pub output_file: Option<PathBuf>,
    /// Failure description; present if and only if `status == Failed`.
    pub error: Option<String>,
}

/// Concurrency-safe keyed collection of task records.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    inner: Arc<RwLock<HashMap<TaskId, TaskRecord>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and insert a `Pending` record.
    ///
    /// Returns a snapshot of the new record.
    pub async fn create(&self, request: Arc<ConversionRequest>) -> TaskRecord {
        self.insert_at(request, Utc::now()).await
    }

    /// Insert a `Pending` record with an explicit creation timestamp.
    /// Exists so that retention behavior can be exercised without waiting.
    pub(crate) async fn insert_at(
        &self,
        request: Arc<ConversionRequest>,
        created_at: DateTime<Utc>,
    ) -> TaskRecord {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            status: TaskStatus::Pending,
            created_at,
            completed_at: None,
            request,
            output_file: None,
            error: None,
        };
        self.inner.write().await.insert(record.id, record.clone());
        record
    }

    /// Return a cloned snapshot of a record.
    pub async fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Apply an atomic in-place mutation to a record.
    ///
    /// The closure observes the record under the write lock, so the mutation
    /// is indivisible with respect to every other operation on the same id.
    /// A missing id is a surfaced [`TaskError::NotFound`], never a silent
    /// no-op; callers that can race an explicit delete must handle it.
    pub async fn update<F>(&self, id: TaskId, mutate: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut guard = self.inner.write().await;
        match guard.get_mut(&id) {
            Some(record) => {
                mutate(record);
                Ok(())
            }
            None => Err(TaskError::NotFound { task_id: id }),
        }
    }

    /// Transition `Pending → Processing`.  Terminal records are left alone.
    pub async fn mark_processing(&self, id: TaskId) -> Result<(), TaskError> {
        self.update(id, |record| {
            if !record.status.is_terminal() {
                record.status = TaskStatus::Processing;
            }
        })
        .await
    }

    /// Transition to `Completed`, recording the artifact path and the
    /// completion timestamp.  Terminal records are left alone.
    pub async fn complete(&self, id: TaskId, output_file: PathBuf) -> Result<(), TaskError> {
        self.update(id, |record| {
            if record.status.is_terminal() {
                return;
            }
            record.status = TaskStatus::Completed;
            record.output_file = Some(output_file);
            record.completed_at = Some(Utc::now());
        })
        .await
    }

    /// Transition to `Failed`, recording the error message and the completion
    /// timestamp.  Terminal records are left alone.
    pub async fn fail(&self, id: TaskId, error: String) -> Result<(), TaskError> {
        self.update(id, |record| {
            if record.status.is_terminal() {
                return;
            }
            record.status = TaskStatus::Failed;
            record.error = Some(error);
            record.completed_at = Some(Utc::now());
        })
        .await
    }

    /// Remove a record, returning it so the caller can clean up the task's
    /// working directory.  `None` for ids that are already gone.
    pub async fn remove(&self, id: TaskId) -> Option<TaskRecord> {
        self.inner.write().await.remove(&id)
    }

    /// Point-in-time snapshot of all records, for the expiry sweeper.
    ///
    /// Not linearizable with concurrent creates; the sweeper tolerates stale
    /// entries by treating already-removed records as already swept.
    pub async fn snapshot(&self) -> Vec<TaskRecord> {
        self.inner.read().await.values().cloned().collect()
    }
}
