// src/engine/core.rs

//! Pure reconciliation core.
//!
//! This module contains a synchronous, deterministic state machine that
//! consumes one [`SourcedEvent`] together with the store's view of the task
//! and produces the commands the IO shell should execute.
//!
//! Store writes complete asynchronously, so the store may still report the
//! old task while an update for it is in flight. The core remembers the last
//! snapshot it dispatched per task and compares new candidates against it.
//! This is what keeps the same pod state, delivered once by each source, from
//! producing two writes.
//!
//! The core is intended to be unit tested without any Tokio, channels, or
//! store.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::{update_reason, CoreStep, DispatchOutcome, DropReason, TaskUpdate};
use crate::model::{SourcedEvent, Task, TaskId};
use crate::translate::{
    are_tasks_equivalent, compute_status, kill_requested, update_task_status, AnnotationKeys,
    ResultCodeResolver,
};

#[derive(Debug, Clone)]
struct Pending {
    seq: u64,
    task: Task,
}

/// Pure core state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
pub struct CoreProcessor {
    annotation_keys: Arc<AnnotationKeys>,
    resolver: Arc<dyn ResultCodeResolver>,
    pending: HashMap<TaskId, Pending>,
    next_seq: u64,
}

impl std::fmt::Debug for CoreProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreProcessor")
            .field("pending", &self.pending.len())
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl CoreProcessor {
    pub fn new(annotation_keys: Arc<AnnotationKeys>, resolver: Arc<dyn ResultCodeResolver>) -> Self {
        Self {
            annotation_keys,
            resolver,
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Snapshot dispatched for `task_id` whose write has not completed yet.
    pub fn pending(&self, task_id: &str) -> Option<&Task> {
        self.pending.get(task_id).map(|p| &p.task)
    }

    /// Handle a single event.
    ///
    /// `stored` is the store's current version of the task, or `None` if the
    /// store does not know it.
    pub fn step(&mut self, sourced: &SourcedEvent, stored: Option<&Task>) -> CoreStep {
        let event = &sourced.event;
        let task_id = event.task_id();

        let Some(stored) = stored else {
            self.pending.remove(task_id);
            info!(task = %task_id, origin = %sourced.origin, "task not found in job store; dropping pod event");
            return CoreStep::skip(task_id, DropReason::NotFound);
        };

        if stored.state().is_terminal() {
            self.pending.remove(task_id);
            info!(task = %task_id, origin = %sourced.origin, "task already finished; dropping pod event");
            return CoreStep::skip(task_id, DropReason::AlreadyTerminal);
        }

        // The store caught up with (or overtook) the pending write.
        if self
            .pending
            .get(task_id)
            .is_some_and(|p| p.task.state().rank() <= stored.state().rank())
        {
            self.pending.remove(task_id);
        }

        let kill_initiated = kill_requested(stored);
        let Some(status) = compute_status(event, stored, kill_initiated, self.resolver.as_ref()) else {
            debug!(
                task = %task_id,
                origin = %sourced.origin,
                phase = %event.pod().phase,
                state = %stored.state(),
                "no forward status for pod event"
            );
            return CoreStep::skip(task_id, DropReason::NoCandidate);
        };

        let Some(candidate) = update_task_status(
            event.pod(),
            &status,
            event.node(),
            stored,
            kill_initiated,
            &self.annotation_keys,
        ) else {
            return CoreStep::skip(task_id, DropReason::NoCandidate);
        };

        if let Some(pending) = self.pending.get(task_id) {
            let differences = are_tasks_equivalent(&candidate, &pending.task);
            if differences.is_empty() {
                debug!(task = %task_id, origin = %sourced.origin, "identical update already dispatched; skipping");
                return CoreStep::skip(task_id, DropReason::Equivalent);
            }
            if candidate.state().rank() < pending.task.state().rank() {
                debug!(
                    task = %task_id,
                    origin = %sourced.origin,
                    pending = %pending.task.state(),
                    candidate = %candidate.state(),
                    "pending update is already further along; skipping"
                );
                return CoreStep::skip(task_id, DropReason::Superseded);
            }
            debug!(task = %task_id, ?differences, "update differs from pending one");
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(
            task_id.to_string(),
            Pending {
                seq,
                task: candidate.clone(),
            },
        );

        CoreStep::dispatch(TaskUpdate {
            seq,
            task_id: task_id.to_string(),
            origin: sourced.origin,
            pod: event.pod().clone(),
            node: event.node().cloned(),
            reason: update_reason(event.pod(), stored.state()),
            prior_state: stored.state(),
            status,
            candidate,
        })
    }

    /// Feed back the result of a store write.
    ///
    /// Once a write completes, the store is the source of truth again. A
    /// failed write must not suppress the redelivery that repairs it.
    pub fn on_outcome(&mut self, outcome: &DispatchOutcome) {
        if self
            .pending
            .get(&outcome.task_id)
            .is_some_and(|p| p.seq == outcome.seq)
        {
            self.pending.remove(&outcome.task_id);
        }
    }
}
