use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default spacing between fresh sibling positions.
pub const POSITION_STEP: f64 = 10.0;

/// Task lifecycle state. Opaque to the ordering core — carried through
/// reconciliation untouched, like the title payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Active,
    Done,
}

/// A task row as the ordering core sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable opaque identifier
    pub id: String,
    /// Owning job (container); tasks never move between jobs
    pub job_id: String,
    /// Parent task within the same job; `None` = root
    pub parent_id: Option<String>,
    /// Ordering key, meaningful only within one sibling group
    pub position: f64,
    /// Lifecycle state (payload as far as ordering is concerned)
    pub status: TaskStatus,
    /// Timestamp of the last structural change
    pub reordered_at: DateTime<Utc>,
    /// Title payload, untouched by the ordering core
    pub title: String,
}

impl Task {
    /// Create a root task with the default starting position.
    pub fn new(id: impl Into<String>, job_id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            job_id: job_id.into(),
            parent_id: None,
            position: POSITION_STEP,
            status: TaskStatus::Todo,
            reordered_at: Utc::now(),
            title: title.into(),
        }
    }

    /// Create a task placed at the end of its intended sibling group.
    ///
    /// `job_tasks` is the current flat task list for the job; only the
    /// group sharing `parent_id` is consulted.
    pub fn new_at_end(
        id: impl Into<String>,
        job_id: impl Into<String>,
        title: impl Into<String>,
        parent_id: Option<&str>,
        job_tasks: &[Task],
    ) -> Self {
        let mut task = Task::new(id, job_id, title);
        task.parent_id = parent_id.map(str::to_string);
        task.position = end_of_group_position(job_tasks, parent_id);
        task
    }
}

/// Position for appending to the `parent_id` sibling group within `tasks`.
pub fn end_of_group_position(tasks: &[Task], parent_id: Option<&str>) -> f64 {
    tasks
        .iter()
        .filter(|t| t.parent_id.as_deref() == parent_id)
        .map(|t| t.position)
        .fold(None, |max: Option<f64>, p| Some(max.map_or(p, |m| m.max(p))))
        .map_or(POSITION_STEP, |max| max + POSITION_STEP)
}

/// Deterministic sibling ordering: position ascending, ties broken by id.
pub fn sibling_order(a: &Task, b: &Task) -> Ordering {
    a.position
        .total_cmp(&b.position)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, parent: Option<&str>, position: f64) -> Task {
        let mut t = Task::new(id, "job-1", format!("task {id}"));
        t.parent_id = parent.map(str::to_string);
        t.position = position;
        t
    }

    #[test]
    fn test_new_at_end_empty_group() {
        let t = Task::new_at_end("a", "job-1", "first", None, &[]);
        assert_eq!(t.position, POSITION_STEP);
        assert_eq!(t.parent_id, None);
    }

    #[test]
    fn test_new_at_end_appends_after_max() {
        let existing = vec![task("a", None, 10.0), task("b", None, 30.0)];
        let t = Task::new_at_end("c", "job-1", "third", None, &existing);
        assert_eq!(t.position, 40.0);
    }

    #[test]
    fn test_new_at_end_only_consults_own_group() {
        let existing = vec![task("a", None, 100.0), task("b", Some("a"), 10.0)];
        let t = Task::new_at_end("c", "job-1", "child", Some("a"), &existing);
        assert_eq!(t.position, 20.0);
    }

    #[test]
    fn test_sibling_order_ties_break_by_id() {
        let a = task("a", None, 10.0);
        let b = task("b", None, 10.0);
        assert_eq!(sibling_order(&a, &b), Ordering::Less);
        assert_eq!(sibling_order(&b, &a), Ordering::Greater);
    }
}
