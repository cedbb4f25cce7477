pub mod json;
pub mod memory;

use chrono::{DateTime, Utc};

use crate::model::task::Task;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not load tasks for job {job_id}: {detail}")]
    FetchFailure { job_id: String, detail: String },
    #[error("could not persist tasks for job {job_id}: {detail}")]
    PersistenceFailure { job_id: String, detail: String },
}

/// Authoritative storage for task records, keyed by job.
pub trait TaskStore {
    /// All tasks belonging to `job_id`, in no particular order.
    fn fetch_tasks_for_job(&self, job_id: &str) -> Result<Vec<Task>, StoreError>;

    /// Replace the job's task set in one atomic write. Either every task in
    /// `tasks` is persisted or none are.
    fn persist_batch(&self, job_id: &str, tasks: &[Task]) -> Result<(), StoreError>;
}

/// Timestamp source for mutation ordering. Implementations must be
/// monotonic within one client session.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub use json::JsonStore;
pub use memory::{MemoryStore, SessionClock};
