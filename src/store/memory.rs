use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};

use crate::model::task::Task;
use crate::store::{Clock, StoreError, TaskStore};

/// In-memory task store. The reference implementation for tests and for
/// callers that bring their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: Mutex<HashMap<String, Vec<Task>>>,
    fail_next: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Seed (or replace) a job's task set directly, outside the batch path.
    pub fn seed(&self, job_id: &str, tasks: Vec<Task>) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.insert(job_id.to_string(), tasks);
    }

    /// Make the next `persist_batch` call fail, for exercising the
    /// whole-batch rollback path.
    pub fn fail_next_persist(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl TaskStore for MemoryStore {
    fn fetch_tasks_for_job(&self, job_id: &str) -> Result<Vec<Task>, StoreError> {
        let jobs = self.jobs.lock().map_err(|_| StoreError::FetchFailure {
            job_id: job_id.to_string(),
            detail: "store mutex poisoned".into(),
        })?;
        Ok(jobs.get(job_id).cloned().unwrap_or_default())
    }

    fn persist_batch(&self, job_id: &str, tasks: &[Task]) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::PersistenceFailure {
                job_id: job_id.to_string(),
                detail: "simulated write failure".into(),
            });
        }
        let mut jobs = self.jobs.lock().map_err(|_| StoreError::PersistenceFailure {
            job_id: job_id.to_string(),
            detail: "store mutex poisoned".into(),
        })?;
        jobs.insert(job_id.to_string(), tasks.to_vec());
        Ok(())
    }
}

/// Wall-clock `Clock` that never moves backwards within a session: when the
/// wall clock fails to advance between calls, the previous timestamp is
/// bumped by one millisecond instead.
#[derive(Debug, Default)]
pub struct SessionClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl SessionClock {
    pub fn new() -> Self {
        SessionClock::default()
    }
}

impl Clock for SessionClock {
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let wall = Utc::now();
        let next = match *last {
            Some(prev) if wall <= prev => prev + Duration::milliseconds(1),
            _ => wall,
        };
        *last = Some(next);
        next
    }
}
