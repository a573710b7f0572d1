//! revoice-core – asynchronous orchestration of voice conversion tasks.
//!
//! A caller submits a conversion job and gets a task id back immediately; the
//! conversion runs on its own spawned task, the caller polls status, fetches
//! the artifact once completed, and either deletes the task explicitly or
//! lets the expiry sweeper reclaim it.
//!
//! Modules:
//! - [`store`] – concurrency-safe in-memory task record store, the single
//!   source of truth for task state.
//! - [`orchestrator`] – submission, background execution, result access,
//!   deletion.
//! - [`engine`] – the opaque conversion engine boundary and the subprocess
//!   adapter.
//! - [`sweeper`] – recurring removal of records past the retention window.

pub mod engine;
pub mod orchestrator;
pub mod store;
pub mod sweeper;
pub mod types;

pub use engine::{CommandEngine, ConversionEngine, ConversionOutput, ConversionPaths};
pub use orchestrator::{Orchestrator, ResultFile};
pub use store::{TaskRecord, TaskStore};
pub use types::{ConversionRequest, EngineError, TaskError, TaskId, TaskStatus};
