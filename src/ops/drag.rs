use chrono::{DateTime, Duration, Utc};

use crate::model::selection::SelectionState;
use crate::model::task::Task;
use crate::ops::ordering::{ParentTarget, PendingMutation, PositionSpec, ancestor_chain};

/// Already-classified drop-zone intent. Classification (pointer position
/// within the target's bounds, etc.) is a UI-layer decision; this module
/// only consumes the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropIntent {
    /// Reorder: land immediately before the target
    Before,
    /// Reorder: land immediately after the target
    After,
    /// Nest: become the last child of the target
    Into,
}

/// The ids that move together for a drag that started on `dragged_id`:
/// the whole selection (in selection order) when the dragged task is part
/// of an active multi-select, otherwise just the dragged task.
pub fn moving_set(selection: &SelectionState, dragged_id: &str) -> Vec<String> {
    if selection.is_multi_select() && selection.contains(dragged_id) {
        selection.order()
    } else {
        vec![dragged_id.to_string()]
    }
}

/// Translate a classified drop into a mutation batch, or `None` when the
/// drop is a no-op (self-drop, dropping onto a descendant of a moved task,
/// or ids that no longer exist).
///
/// Multi-select order is preserved by chaining: the first task is placed
/// relative to the drop target, each subsequent task right after the
/// previous one, with timestamps 1 ms apart so the engine's batch sort
/// keeps the intended relative order. The descendant guard here mirrors
/// the engine's cycle rejection; both sides check.
pub fn plan_drop(
    tasks: &[Task],
    moving: &[String],
    target_id: &str,
    intent: DropIntent,
    base_time: DateTime<Utc>,
) -> Option<Vec<PendingMutation>> {
    if moving.is_empty() {
        return None;
    }
    let target = tasks.iter().find(|t| t.id == target_id)?;
    if moving.iter().any(|id| !tasks.iter().any(|t| t.id == *id)) {
        return None;
    }
    // Self-drop guard
    if moving.iter().any(|id| id == target_id) {
        return None;
    }
    // Descendant-drop guard: a moved task may not be an ancestor of the target
    let target_ancestors = ancestor_chain(tasks, target_id);
    if moving.iter().any(|id| target_ancestors.contains(id)) {
        return None;
    }

    let parent = match intent {
        DropIntent::Into => ParentTarget::Task(target_id.to_string()),
        DropIntent::Before | DropIntent::After => match &target.parent_id {
            Some(p) => ParentTarget::Task(p.clone()),
            None => ParentTarget::Root,
        },
    };

    let mut batch = Vec::with_capacity(moving.len());
    let mut prev: Option<&String> = None;
    for (i, id) in moving.iter().enumerate() {
        let position = match (intent, prev) {
            (DropIntent::Into, _) => PositionSpec::Tail,
            (DropIntent::Before, None) => PositionSpec::Before(target_id.to_string()),
            (DropIntent::After, None) => PositionSpec::After(target_id.to_string()),
            (_, Some(prev)) => PositionSpec::After(prev.clone()),
        };
        batch.push(PendingMutation {
            task_id: id.clone(),
            parent: parent.clone(),
            position: Some(position),
            timestamp: base_time + Duration::milliseconds(i as i64),
        });
        prev = Some(id);
    }
    Some(batch)
}
