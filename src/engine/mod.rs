// src/engine/mod.rs

//! Pod event reconciliation engine.
//!
//! This module ties together:
//! - the stream merger (direct + reconciler sources → one sequence)
//! - the pure core, deciding per event whether a task update is needed
//! - the dispatcher, committing updates to the job store
//! - the processing loop and its lifecycle controller
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::model::{EventOrigin, NodeSnapshot, PodSnapshot, Task, TaskId, TaskState, TaskStatus};
use crate::store::StoreError;

pub mod core;
pub mod dispatcher;
pub mod lifecycle;
pub mod merger;
pub mod runtime;

pub use self::core::CoreProcessor;
pub use dispatcher::Dispatcher;
pub use lifecycle::NotificationProcessor;
pub use merger::spawn_merger;
pub use runtime::Runtime;

/// A task update the core decided to commit.
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    /// Monotonic per-processor dispatch number.
    pub seq: u64,
    pub task_id: TaskId,
    pub origin: EventOrigin,
    pub pod: PodSnapshot,
    pub node: Option<NodeSnapshot>,
    /// Status admitted by the translator.
    pub status: TaskStatus,
    /// State of the task the decision was made against.
    pub prior_state: TaskState,
    /// Expected result of applying the update to the prior task.
    pub candidate: Task,
    /// Reason text recorded with the store write.
    pub reason: String,
}

/// Why the core decided not to dispatch an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The store does not know the task.
    NotFound,
    /// The task already finished.
    AlreadyTerminal,
    /// The pod gave no status that moves the task forward.
    NoCandidate,
    /// The update would not change anything.
    Equivalent,
    /// A pending update already moved the task further.
    Superseded,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Submit this update to the job store.
    Dispatch(TaskUpdate),
    /// Nothing to do for this event.
    Drop { task_id: TaskId, reason: DropReason },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
}

impl CoreStep {
    fn dispatch(update: TaskUpdate) -> Self {
        Self {
            commands: vec![CoreCommand::Dispatch(update)],
        }
    }

    fn skip(task_id: &str, reason: DropReason) -> Self {
        Self {
            commands: vec![CoreCommand::Drop {
                task_id: task_id.to_string(),
                reason,
            }],
        }
    }
}

/// Completion report of a store write, fed back into the core.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub seq: u64,
    pub task_id: TaskId,
    pub state: TaskState,
    pub result: Result<(), StoreError>,
}

/// Counters reported when the processing loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub received: u64,
    pub dispatched: u64,
    pub dropped: u64,
    pub failed_writes: u64,
}

/// Reason text attached to every store write issued by the engine.
pub fn update_reason(pod: &PodSnapshot, prior_state: TaskState) -> String {
    format!(
        "Pod status updated from kubernetes node (k8phase='{}', taskState={})",
        pod.phase, prior_state
    )
}
