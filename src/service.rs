use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::model::selection::SelectionState;
use crate::ops::drag::{self, DropIntent};
use crate::ops::ordering::{self, BatchReport};
use crate::ops::tree::{self, Forest};
use crate::store::{Clock, StoreError, TaskStore};

/// Reorder placement relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

/// The drag/drop entry point: wires drop translation, batch reconciliation,
/// and persistence together, serializing batches per job.
///
/// Batches for one job never run concurrently (a per-job mutex guards the
/// fetch/reconcile/persist span); different jobs proceed independently.
/// Nothing becomes visible until `persist_batch` succeeds — the store stays
/// authoritative, so a failed write leaves the pre-drag arrangement fully
/// intact and the caller retries with a fresh drop against current state.
pub struct TaskService<S, C> {
    store: S,
    clock: C,
    job_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: TaskStore, C: Clock> TaskService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        TaskService {
            store,
            clock,
            job_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop `dragged_id` immediately before or after `target_id`, adopting
    /// the target's parent.
    pub fn reorder_task(
        &self,
        job_id: &str,
        dragged_id: &str,
        target_id: &str,
        placement: Placement,
    ) -> Result<BatchReport, StoreError> {
        let intent = match placement {
            Placement::Before => DropIntent::Before,
            Placement::After => DropIntent::After,
        };
        self.submit(job_id, &[dragged_id.to_string()], target_id, intent)
    }

    /// Nest `dragged_id` as the last child of `new_parent_id`.
    pub fn nest_task(
        &self,
        job_id: &str,
        dragged_id: &str,
        new_parent_id: &str,
    ) -> Result<BatchReport, StoreError> {
        self.submit(
            job_id,
            &[dragged_id.to_string()],
            new_parent_id,
            DropIntent::Into,
        )
    }

    /// Drop an entire selection onto `target_id`, preserving selection order.
    pub fn drag_selection(
        &self,
        job_id: &str,
        selection: &SelectionState,
        target_id: &str,
        intent: DropIntent,
    ) -> Result<BatchReport, StoreError> {
        self.submit(job_id, &selection.order(), target_id, intent)
    }

    /// The renderable forest for a job. A structurally broken task set is
    /// reported once and degraded to the reachable part rather than failing
    /// the read.
    pub fn get_ordered_tree(&self, job_id: &str) -> Result<Forest, StoreError> {
        let tasks = self.store.fetch_tasks_for_job(job_id)?;
        match tree::build_forest(&tasks) {
            Ok(forest) => Ok(forest),
            Err(e) => {
                eprintln!("warning: structural problem in job {job_id}: {e}");
                Ok(tree::build_forest_lossy(&tasks))
            }
        }
    }

    fn submit(
        &self,
        job_id: &str,
        moving: &[String],
        target_id: &str,
        intent: DropIntent,
    ) -> Result<BatchReport, StoreError> {
        let lock = self.job_lock(job_id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let tasks = self.store.fetch_tasks_for_job(job_id)?;
        let Some(batch) = drag::plan_drop(&tasks, moving, target_id, intent, self.clock.now())
        else {
            // No-op drop: nothing changes, nothing is written.
            return Ok(BatchReport {
                tasks,
                outcomes: Vec::new(),
            });
        };
        let report = ordering::apply_batch(&tasks, &batch);
        self.store.persist_batch(job_id, &report.tasks)?;
        Ok(report)
    }

    fn job_lock(&self, job_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.job_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(job_id.to_string()).or_default().clone()
    }
}
