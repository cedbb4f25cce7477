use std::collections::HashMap;

use crate::model::task::{Task, sibling_order};

/// Hard bound on tree depth. Nesting is user-controlled, so the walk is
/// capped rather than trusting the data.
pub const MAX_DEPTH: usize = 1000;

/// Error type for forest construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("task tree exceeds maximum depth at task {task_id}")]
    DepthExceeded { task_id: String },
    #[error("{count} task(s) unreachable from any root (parent cycle or dangling parent)")]
    UnreachableTasks { count: usize },
}

/// One task in the rendered forest, with derived depth and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    pub task: Task,
    pub depth: usize,
    pub children: Vec<TaskNode>,
}

/// An ordered collection of root-anchored trees for one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    pub roots: Vec<TaskNode>,
}

impl Forest {
    /// Task ids in visual (depth-first, pre-order) order. This is the order
    /// range selection and multi-drag projection consume.
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&TaskNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node.task.id.clone());
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Total number of tasks in the forest.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&TaskNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a node by task id (pre-order search).
    pub fn find(&self, id: &str) -> Option<&TaskNode> {
        let mut stack: Vec<&TaskNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.task.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }
}

/// Build the ordered forest for a flat task list.
///
/// Tasks are grouped by `parent_id`; each group is sorted by position
/// (ties by id); depth is derived while walking from the roots. The input
/// is never mutated. Fails if any task is unreachable from a root or the
/// depth cap is hit — both indicate corrupted data, not a user action.
pub fn build_forest(tasks: &[Task]) -> Result<Forest, StructuralError> {
    let (forest, reached, overflow) = assemble(tasks);
    if let Some(task_id) = overflow {
        return Err(StructuralError::DepthExceeded { task_id });
    }
    if reached < tasks.len() {
        return Err(StructuralError::UnreachableTasks {
            count: tasks.len() - reached,
        });
    }
    Ok(forest)
}

/// Best-effort variant: returns whatever is reachable from the roots within
/// the depth cap, silently dropping the rest. Used for the degraded render
/// path after `build_forest` reports a structural problem.
pub fn build_forest_lossy(tasks: &[Task]) -> Forest {
    assemble(tasks).0
}

fn assemble(tasks: &[Task]) -> (Forest, usize, Option<String>) {
    let mut groups: HashMap<Option<&str>, Vec<&Task>> = HashMap::new();
    for t in tasks {
        groups.entry(t.parent_id.as_deref()).or_default().push(t);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| sibling_order(a, b));
    }

    let mut reached = 0;
    let mut overflow = None;
    let roots = build_group(&groups, None, 0, &mut reached, &mut overflow);
    (Forest { roots }, reached, overflow)
}

fn build_group(
    groups: &HashMap<Option<&str>, Vec<&Task>>,
    parent: Option<&str>,
    depth: usize,
    reached: &mut usize,
    overflow: &mut Option<String>,
) -> Vec<TaskNode> {
    let Some(group) = groups.get(&parent) else {
        return Vec::new();
    };
    if depth >= MAX_DEPTH {
        if overflow.is_none() {
            *overflow = Some(group[0].id.clone());
        }
        return Vec::new();
    }
    group
        .iter()
        .map(|t| {
            *reached += 1;
            TaskNode {
                task: (*t).clone(),
                depth,
                children: build_group(groups, Some(t.id.as_str()), depth + 1, reached, overflow),
            }
        })
        .collect()
}
