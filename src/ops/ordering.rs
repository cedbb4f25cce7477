use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::model::task::{POSITION_STEP, Task, sibling_order};
use crate::ops::tree::MAX_DEPTH;

/// Minimum gap between insertion neighbors. Below this the sibling group is
/// renumbered to even multiples of the step before inserting; halving from
/// a fresh step-10 gap crosses it on the ninth consecutive insertion.
pub const MIN_GAP: f64 = 0.05;

/// Where a mutation wants the task's parent to end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentTarget {
    /// Leave the current parent alone
    Keep,
    /// Move to the root level
    Root,
    /// Nest under the given task
    Task(String),
}

/// Where a mutation wants the task's position to end up.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionSpec {
    /// A caller-supplied position key, used verbatim
    Exact(f64),
    /// Immediately before this sibling in the destination group
    Before(String),
    /// Immediately after this sibling in the destination group
    After(String),
    /// End of the destination sibling group
    Tail,
}

/// One pending structural edit, as produced by drag translation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub task_id: String,
    pub parent: ParentTarget,
    pub position: Option<PositionSpec>,
    pub timestamp: DateTime<Utc>,
}

/// Why a single mutation was dropped from a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("moving {task_id} under {parent_id} would create a cycle")]
    CycleDetected { task_id: String, parent_id: String },
    #[error("parent {parent_id} belongs to job {parent_job}, not job {job_id}")]
    CrossJobReference {
        parent_id: String,
        parent_job: String,
        job_id: String,
    },
    #[error("mutation references unknown task {0}")]
    UnknownTask(String),
    #[error("mutation references unknown parent {0}")]
    UnknownParent(String),
    #[error("malformed mutation: {0}")]
    Malformed(String),
}

/// Per-mutation result, reported in application (timestamp) order.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub task_id: String,
    pub result: Result<(), RejectReason>,
}

/// The reconciled task list plus what happened to each mutation.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub tasks: Vec<Task>,
    pub outcomes: Vec<MutationOutcome>,
}

impl BatchReport {
    pub fn all_applied(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Task ids whose mutations were rejected, with reasons — the set the
    /// UI should snap back individually.
    pub fn rejected(&self) -> Vec<(&str, &RejectReason)> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.result
                    .as_ref()
                    .err()
                    .map(|reason| (o.task_id.as_str(), reason))
            })
            .collect()
    }
}

/// Reconcile a batch of pending mutations against `tasks`.
///
/// Mutations are applied sequentially to a working copy in timestamp order
/// (ties by task id, so reconciliation is deterministic even when source
/// timestamps coincide). A rejected mutation leaves its task untouched and
/// the rest of the batch still proceeds. The input list is never mutated;
/// callers persist the returned copy as one atomic write.
pub fn apply_batch(tasks: &[Task], batch: &[PendingMutation]) -> BatchReport {
    let mut working = tasks.to_vec();

    let mut ordered: Vec<&PendingMutation> = batch.iter().collect();
    ordered.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    let outcomes = ordered
        .into_iter()
        .map(|m| MutationOutcome {
            task_id: m.task_id.clone(),
            result: apply_one(&mut working, m),
        })
        .collect();

    BatchReport {
        tasks: working,
        outcomes,
    }
}

/// Ancestor ids of `id`, nearest first. Bounded and cycle-safe so corrupted
/// data cannot loop the walk.
pub(crate) fn ancestor_chain(tasks: &[Task], id: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current = tasks
        .iter()
        .find(|t| t.id == id)
        .and_then(|t| t.parent_id.clone());
    while let Some(pid) = current {
        if !seen.insert(pid.clone()) || chain.len() >= MAX_DEPTH {
            break;
        }
        current = tasks
            .iter()
            .find(|t| t.id == pid)
            .and_then(|t| t.parent_id.clone());
        chain.push(pid);
    }
    chain
}

fn apply_one(working: &mut [Task], m: &PendingMutation) -> Result<(), RejectReason> {
    if m.task_id.is_empty() {
        return Err(RejectReason::Malformed("missing task id".into()));
    }
    let idx = idx_of(working, &m.task_id).ok_or_else(|| RejectReason::UnknownTask(m.task_id.clone()))?;
    let job_id = working[idx].job_id.clone();

    let new_parent: Option<String> = match &m.parent {
        ParentTarget::Keep => working[idx].parent_id.clone(),
        ParentTarget::Root => None,
        ParentTarget::Task(pid) => {
            let p_idx =
                idx_of(working, pid).ok_or_else(|| RejectReason::UnknownParent(pid.clone()))?;
            if working[p_idx].job_id != job_id {
                return Err(RejectReason::CrossJobReference {
                    parent_id: pid.clone(),
                    parent_job: working[p_idx].job_id.clone(),
                    job_id,
                });
            }
            if *pid == m.task_id
                || ancestor_chain(working, pid).iter().any(|a| *a == m.task_id)
            {
                return Err(RejectReason::CycleDetected {
                    task_id: m.task_id.clone(),
                    parent_id: pid.clone(),
                });
            }
            Some(pid.clone())
        }
    };

    // Resolve the position before touching the task, so a rejected mutation
    // leaves its prior parent and position intact.
    let position = match &m.position {
        None => None,
        Some(spec) => Some(resolve_position(
            working,
            &job_id,
            &m.task_id,
            new_parent.as_deref(),
            spec,
        )?),
    };

    let task = &mut working[idx];
    task.parent_id = new_parent;
    if let Some(p) = position {
        task.position = p;
    }
    task.reordered_at = m.timestamp;
    Ok(())
}

/// Turn a position spec into a concrete key within the destination sibling
/// group. May renumber the group when no usable gap remains; by that point
/// every validation has passed, so the mutation is guaranteed to apply.
fn resolve_position(
    working: &mut [Task],
    job_id: &str,
    moving_id: &str,
    parent: Option<&str>,
    spec: &PositionSpec,
) -> Result<f64, RejectReason> {
    match spec {
        PositionSpec::Exact(v) => {
            if !v.is_finite() {
                return Err(RejectReason::Malformed(format!("non-finite position {v}")));
            }
            Ok(*v)
        }
        PositionSpec::Tail => {
            let sibs = sibling_list(working, job_id, parent, moving_id);
            Ok(sibs
                .last()
                .map_or(POSITION_STEP, |(_, p)| p + POSITION_STEP))
        }
        PositionSpec::Before(target) | PositionSpec::After(target) => {
            let sibs = sibling_list(working, job_id, parent, moving_id);
            let t_idx = sibs.iter().position(|(id, _)| id == target).ok_or_else(|| {
                RejectReason::Malformed(format!(
                    "placement target {target} is not in the destination group"
                ))
            })?;
            let (pred, succ) = match spec {
                PositionSpec::After(_) => (
                    Some(t_idx),
                    (t_idx + 1 < sibs.len()).then_some(t_idx + 1),
                ),
                _ => (t_idx.checked_sub(1), Some(t_idx)),
            };
            let pred_id = pred.map(|i| sibs[i].0.clone());
            let succ_id = succ.map(|i| sibs[i].0.clone());
            Ok(position_between(
                working,
                job_id,
                parent,
                moving_id,
                pred_id.as_deref(),
                succ_id.as_deref(),
            ))
        }
    }
}

/// Position strictly between the predecessor and successor siblings, either
/// of which may be absent (head/tail insertion).
fn position_between(
    working: &mut [Task],
    job_id: &str,
    parent: Option<&str>,
    moving_id: &str,
    pred: Option<&str>,
    succ: Option<&str>,
) -> f64 {
    match (pred, succ) {
        (None, None) => POSITION_STEP,
        (Some(p), None) => position_of(working, p) + POSITION_STEP,
        (None, Some(s)) => position_of(working, s) - POSITION_STEP,
        (Some(p), Some(s)) => {
            let mut lo = position_of(working, p);
            let mut hi = position_of(working, s);
            if hi - lo < MIN_GAP {
                renumber_group(working, job_id, parent, moving_id);
                lo = position_of(working, p);
                hi = position_of(working, s);
            }
            (lo + hi) / 2.0
        }
    }
}

/// Reset a sibling group (minus the task being inserted) to evenly spaced
/// multiples of the step, preserving the current order.
fn renumber_group(working: &mut [Task], job_id: &str, parent: Option<&str>, exclude: &str) {
    let ids: Vec<String> = sibling_list(working, job_id, parent, exclude)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    for (i, id) in ids.iter().enumerate() {
        if let Some(t) = working.iter_mut().find(|t| t.id == *id) {
            t.position = (i as f64 + 1.0) * POSITION_STEP;
        }
    }
}

/// The `(id, position)` pairs of a sibling group in sibling order, with the
/// moving task excluded (it is being re-inserted).
fn sibling_list(
    working: &[Task],
    job_id: &str,
    parent: Option<&str>,
    exclude: &str,
) -> Vec<(String, f64)> {
    let mut sibs: Vec<&Task> = working
        .iter()
        .filter(|t| t.job_id == job_id && t.parent_id.as_deref() == parent && t.id != exclude)
        .collect();
    sibs.sort_by(|a, b| sibling_order(a, b));
    sibs.into_iter().map(|t| (t.id.clone(), t.position)).collect()
}

fn idx_of(tasks: &[Task], id: &str) -> Option<usize> {
    tasks.iter().position(|t| t.id == id)
}

fn position_of(tasks: &[Task], id: &str) -> f64 {
    // Ids handed to this helper were just found in the sibling list.
    tasks
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.position)
        .unwrap_or(0.0)
}
