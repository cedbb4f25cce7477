//! Hierarchical task ordering and drag/drop reconciliation for per-job
//! task trees.
//!
//! Tasks form a bounded-depth forest per job: sibling order comes from
//! fractional position keys (no renumbering on every insert), parents are
//! plain id references. Structural edits arrive as drag gestures, get
//! translated into mutation batches, and are reconciled deterministically —
//! timestamp order, ties by task id — with per-mutation rejection for
//! cycles and cross-job parents.
//!
//! - [`model`] — the `Task` record and client-local selection state
//! - [`ops`] — tree building, batch reconciliation, drop translation
//! - [`store`] — the persistence and clock seams, with in-memory and
//!   JSON-file reference stores
//! - [`service`] — `TaskService`, the per-job-serialized entry point

pub mod model;
pub mod ops;
pub mod service;
pub mod store;

pub use model::selection::{SelectionMode, SelectionState};
pub use model::task::{POSITION_STEP, Task, TaskStatus};
pub use ops::drag::{DropIntent, moving_set, plan_drop};
pub use ops::ordering::{
    BatchReport, MIN_GAP, MutationOutcome, ParentTarget, PendingMutation, PositionSpec,
    RejectReason, apply_batch,
};
pub use ops::tree::{
    Forest, MAX_DEPTH, StructuralError, TaskNode, build_forest, build_forest_lossy,
};
pub use service::{Placement, TaskService};
pub use store::{Clock, JsonStore, MemoryStore, SessionClock, StoreError, TaskStore};
