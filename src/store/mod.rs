// src/store/mod.rs

//! Job store abstraction.
//!
//! The engine never mutates tasks directly. It hands the store a change
//! function that is applied to the store's current version of the task, so
//! concurrent writers can not lose each other's updates.
//!
//! - [`InMemoryJobStore`] backs the replay mode and the tests.
//! - Production deployments plug in their own [`JobStore`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::model::{Job, Task};

mod memory;

pub use memory::InMemoryJobStore;

/// Boxed future returned by store writes.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Change function applied by the store to its current version of a task.
///
/// Returning `None` leaves the task untouched.
pub type TaskChange = Box<dyn FnOnce(&Task) -> Option<Task> + Send>;

/// Tag identifying the subsystem that requested a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Update derived from an orchestrator notification.
    Kube,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Kube => f.write_str("kube"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("task {0} not found")]
    TaskNotFound(String),

    #[error("update of task {task_id} rejected: {reason}")]
    Rejected { task_id: String, reason: String },

    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

/// Capability the engine needs from the job-management store.
pub trait JobStore: Send + Sync {
    /// Current job and task for `task_id`, if the task exists.
    fn find_task(&self, task_id: &str) -> Option<(Job, Task)>;

    /// Apply `change` to the stored task.
    ///
    /// The returned future is `'static` so the caller can drive it on a
    /// separate task; implementations must not borrow `self` across it.
    fn update_task(
        &self,
        task_id: &str,
        change: TaskChange,
        trigger: Trigger,
        reason: String,
    ) -> BoxFuture<'static, Result<(), StoreError>>;
}
