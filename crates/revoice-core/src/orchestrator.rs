//! Task submission, background execution, result access and deletion.
//!
//! [`Orchestrator`] is the single injected handle over the task store.
//! Submission inserts a `Pending` record and spawns the execution future on
//! the runtime; the submitting caller gets the record snapshot back
//! immediately and never waits on the conversion.  The worker communicates
//! its outcome only by mutating the record through the store.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tracing::{info, warn};

use crate::engine::{ConversionEngine, ConversionPaths};
use crate::store::{TaskRecord, TaskStore};
use crate::types::{ConversionRequest, TaskError, TaskId, TaskStatus};

/// Deterministic working directory for a task id.
pub fn task_work_dir(work_root: &Path, id: TaskId) -> PathBuf {
    work_root.join(format!("tts-{id}"))
}

/// A completed task's artifact, opened for streaming.
#[derive(Debug)]
pub struct ResultFile {
    pub record: TaskRecord,
    pub file: File,
    pub len: u64,
    pub path: PathBuf,
}

/// Handle that owns the store, the engine and the work root.
///
/// Constructed once at startup and shared (`Arc`) between request handlers.
/// There is no process-global state; dropping the handle and its clones tears
/// everything down.
pub struct Orchestrator {
    store: TaskStore,
    engine: Arc<dyn ConversionEngine>,
    work_root: PathBuf,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Orchestrator(work_root: {})", self.work_root.display())
    }
}

impl Orchestrator {
    pub fn new(
        store: TaskStore,
        engine: Arc<dyn ConversionEngine>,
        work_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            engine,
            work_root: work_root.into(),
        }
    }

    /// The store handle, shared with the expiry sweeper.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn work_dir(&self, id: TaskId) -> PathBuf {
        task_work_dir(&self.work_root, id)
    }

    fn paths_for(&self, id: TaskId, request: &ConversionRequest) -> ConversionPaths {
        let work_dir = self.work_dir(id);
        ConversionPaths {
            tts_file: work_dir.join("tts-take.wav"),
            output_file: work_dir.join(format!(
                "{id}.{}",
                request.export_format.to_lowercase()
            )),
            work_dir,
        }
    }

    /// Accept a conversion job.
    ///
    /// Creates the `Pending` record, spawns the execution future and returns
    /// the record snapshot immediately.  Each task is executed at most once;
    /// there is no retry of a failed conversion.
    pub async fn submit(&self, request: ConversionRequest) -> TaskRecord {
        let request = Arc::new(request);
        let record = self.store.create(Arc::clone(&request)).await;
        let id = record.id;

        let store = self.store.clone();
        let engine = Arc::clone(&self.engine);
        let paths = self.paths_for(id, &request);
        tokio::spawn(async move {
            execute(store, engine, id, request, paths).await;
        });

        info!(task_id = %id, "conversion task accepted");
        record
    }

    /// Snapshot of a task's current record.
    pub async fn status(&self, id: TaskId) -> Result<TaskRecord, TaskError> {
        self.store
            .get(id)
            .await
            .ok_or(TaskError::NotFound { task_id: id })
    }

    /// Open a completed task's artifact for streaming.
    ///
    /// Read-only; the record's state is unchanged.  Never blocks beyond the
    /// store's critical section and the file open itself.
    pub async fn open_result(&self, id: TaskId) -> Result<ResultFile, TaskError> {
        let record = self.status(id).await?;
        if record.status != TaskStatus::Completed {
            return Err(TaskError::InvalidState {
                task_id: id,
                status: record.status,
            });
        }
        let path = match record.output_file.clone() {
            Some(path) => path,
            None => {
                // Unreachable if the store's invariants hold; surface it as a
                // missing artifact rather than panicking.
                return Err(TaskError::MissingArtifact {
                    task_id: id,
                    path: self.work_dir(id).display().to_string(),
                });
            }
        };

        let file = File::open(&path).await.map_err(|_| TaskError::MissingArtifact {
            task_id: id,
            path: path.display().to_string(),
        })?;
        let len = file
            .metadata()
            .await
            .map(|m| m.len())
            .map_err(|_| TaskError::MissingArtifact {
                task_id: id,
                path: path.display().to_string(),
            })?;

        Ok(ResultFile {
            record,
            file,
            len,
            path,
        })
    }

    /// Delete a task and its working directory.
    ///
    /// Safe in any status.  A worker still running for this id observes
    /// `NotFound` on its next store call and discards its own artifacts.
    pub async fn delete(&self, id: TaskId) -> Result<(), TaskError> {
        match self.store.remove(id).await {
            Some(_) => {
                remove_dir_best_effort(&self.work_dir(id)).await;
                info!(task_id = %id, "task deleted");
                Ok(())
            }
            None => Err(TaskError::NotFound { task_id: id }),
        }
    }
}

/// Drive a single task to its terminal state.
///
/// Runs on its own spawned task; every outcome, including infrastructure
/// failures before the engine is even invoked, ends up in the record.  The
/// working directory path is fixed before the first fallible step so cleanup
/// always has a valid target.
async fn execute(
    store: TaskStore,
    engine: Arc<dyn ConversionEngine>,
    id: TaskId,
    request: Arc<ConversionRequest>,
    paths: ConversionPaths,
) {
    if let Err(e) = tokio::fs::create_dir_all(&paths.work_dir).await {
        warn!(task_id = %id, error = %e, "failed to create working directory");
        if store
            .fail(id, format!("failed to create working directory: {e}"))
            .await
            .is_err()
        {
            warn!(task_id = %id, "task deleted before execution started");
        }
        return;
    }

    if store.mark_processing(id).await.is_err() {
        // Deleted between creation and dispatch; nothing to report to.
        warn!(task_id = %id, "task deleted before processing began");
        remove_dir_best_effort(&paths.work_dir).await;
        return;
    }

    match engine.convert(&request, &paths).await {
        Ok(output) => {
            info!(
                task_id = %id,
                output = %output.output_file.display(),
                message = %output.message,
                "conversion succeeded"
            );
            if store.complete(id, output.output_file).await.is_err() {
                // An explicit delete raced the conversion; the record is gone,
                // so the artifact must not outlive it.
                warn!(task_id = %id, "task deleted during conversion; discarding artifact");
                remove_dir_best_effort(&paths.work_dir).await;
            }
        }
        Err(e) => {
            warn!(task_id = %id, error = %e, "conversion failed");
            if store.fail(id, e.to_string()).await.is_err() {
                warn!(task_id = %id, "task deleted during conversion");
            }
            remove_dir_best_effort(&paths.work_dir).await;
        }
    }
}

/// Best-effort removal of a working directory; "already absent" is fine.
///
/// Used on the failure path, on explicit deletion and by the sweeper; a
/// removal error is logged and swallowed so it never stops the surrounding
/// operation.
pub(crate) async fn remove_dir_best_effort(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %dir.display(), error = %e, "failed to remove working directory");
        }
    }
}
