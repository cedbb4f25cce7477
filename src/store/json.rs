use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::model::task::Task;
use crate::store::{StoreError, TaskStore};

/// JSON-file task store: one pretty-printed `<job_id>.json` per job in a
/// single directory. Writes go through a temp file + rename so a crashed
/// write can never leave a half-written job file behind.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonStore { dir: dir.into() }
    }

    fn job_path(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{job_id}.json"))
    }
}

impl TaskStore for JsonStore {
    fn fetch_tasks_for_job(&self, job_id: &str) -> Result<Vec<Task>, StoreError> {
        let path = self.job_path(job_id);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            // A job that was never persisted is an empty job, not an error.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::FetchFailure {
                    job_id: job_id.to_string(),
                    detail: e.to_string(),
                });
            }
        };
        serde_json::from_str(&content).map_err(|e| StoreError::FetchFailure {
            job_id: job_id.to_string(),
            detail: e.to_string(),
        })
    }

    fn persist_batch(&self, job_id: &str, tasks: &[Task]) -> Result<(), StoreError> {
        let fail = |detail: String| StoreError::PersistenceFailure {
            job_id: job_id.to_string(),
            detail,
        };
        let content = serde_json::to_string_pretty(tasks).map_err(|e| fail(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| fail(e.to_string()))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| fail(e.to_string()))?;
        tmp.persist(self.job_path(job_id))
            .map_err(|e| fail(e.error.to_string()))?;
        Ok(())
    }
}
