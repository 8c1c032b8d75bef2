// src/engine/dispatcher.rs

//! Commits task updates to the job store without blocking the event loop.
//!
//! Each write runs on its own Tokio task. Completions are collected through a
//! [`JoinSet`] and handed back to the processing loop as
//! [`DispatchOutcome`]s. Failed writes are logged and not retried; the
//! reconciler source redelivers the pod later.
//!
//! A write that panics is reported like any other failed write, so every
//! submitted update yields exactly one outcome.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::engine::{DispatchOutcome, TaskUpdate};
use crate::model::Task;
use crate::store::{JobStore, StoreError, TaskChange, Trigger};
use crate::translate::{kill_requested, update_task_status, AnnotationKeys};

pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    annotation_keys: Arc<AnnotationKeys>,
    in_flight: JoinSet<DispatchOutcome>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(store: Arc<dyn JobStore>, annotation_keys: Arc<AnnotationKeys>) -> Self {
        Self {
            store,
            annotation_keys,
            in_flight: JoinSet::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Start the store write for `update`.
    ///
    /// The change function recomputes the update against whatever version of
    /// the task the store holds when it applies the change, so a task that
    /// moved on in the meantime is never regressed.
    pub fn submit(&mut self, update: TaskUpdate) {
        let TaskUpdate {
            seq,
            task_id,
            origin,
            pod,
            node,
            status,
            reason,
            candidate,
            ..
        } = update;

        debug!(task = %task_id, %origin, state = %candidate.state(), %reason, "dispatching task update");

        let keys = Arc::clone(&self.annotation_keys);
        let change: TaskChange = Box::new(move |current: &Task| {
            update_task_status(&pod, &status, node.as_ref(), current, kill_requested(current), &keys)
        });

        let write = self.store.update_task(&task_id, change, Trigger::Kube, reason);
        let state = candidate.state();

        self.in_flight.spawn(async move {
            let result = match tokio::spawn(write).await {
                Ok(result) => result,
                Err(join_err) => Err(StoreError::Unavailable(format!(
                    "task update did not complete: {join_err}"
                ))),
            };
            DispatchOutcome {
                seq,
                task_id,
                state,
                result,
            }
        });
    }

    /// Next completed write, or `None` if nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<DispatchOutcome> {
        loop {
            match self.in_flight.join_next().await? {
                Ok(outcome) => {
                    log_outcome(&outcome);
                    return Some(outcome);
                }
                Err(join_err) => {
                    // Only reachable if the dispatch task itself was aborted.
                    error!(error = %join_err, "task update did not complete");
                }
            }
        }
    }

    /// Await every in-flight write.
    pub async fn drain(&mut self) -> Vec<DispatchOutcome> {
        if !self.in_flight.is_empty() {
            info!(in_flight = self.in_flight.len(), "waiting for in-flight task updates");
        }
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_outcome().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn log_outcome(outcome: &DispatchOutcome) {
    match &outcome.result {
        Ok(()) => debug!(task = %outcome.task_id, state = %outcome.state, "task update committed"),
        Err(StoreError::TaskNotFound(_)) => {
            info!(task = %outcome.task_id, "task disappeared before the update was applied")
        }
        Err(err) => error!(
            task = %outcome.task_id,
            state = %outcome.state,
            error = %err,
            "failed to update task from pod event"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CoreProcessor;
    use crate::engine::CoreCommand;
    use crate::model::{
        ContainerState, ContainerStatus, EventOrigin, Job, PodEvent, PodPhase, PodSnapshot,
        SourcedEvent, TaskState, TaskStatus,
    };
    use crate::store::{BoxFuture, InMemoryJobStore};
    use crate::translate::DefaultResultCodeResolver;

    /// Store whose writes panic when polled.
    struct PanickingStore {
        inner: InMemoryJobStore,
    }

    impl JobStore for PanickingStore {
        fn find_task(&self, task_id: &str) -> Option<(Job, Task)> {
            self.inner.find_task(task_id)
        }

        fn update_task(
            &self,
            _task_id: &str,
            _change: TaskChange,
            _trigger: Trigger,
            _reason: String,
        ) -> BoxFuture<'static, Result<(), StoreError>> {
            Box::pin(async { panic!("store connection reset") })
        }
    }

    fn running_event() -> SourcedEvent {
        let mut pod = PodSnapshot::new("t1", PodPhase::Running);
        pod.containers.push(ContainerStatus {
            name: "main".into(),
            state: ContainerState::Running { started_at_ms: 1 },
        });
        SourcedEvent {
            origin: EventOrigin::Direct,
            event: PodEvent::observed(pod, None),
        }
    }

    fn update_for(task: &Task) -> TaskUpdate {
        let keys = Arc::new(AnnotationKeys::default());
        let mut core = CoreProcessor::new(keys, Arc::new(DefaultResultCodeResolver));
        let step = core.step(&running_event(), Some(task));
        match step.commands.into_iter().next() {
            Some(CoreCommand::Dispatch(update)) => update,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn committed_update_is_reported() {
        let store = InMemoryJobStore::new();
        let task = Task::new("t1", "j1");
        store.insert(Job::new("j1"), task.clone());

        let mut dispatcher = Dispatcher::new(Arc::new(store.clone()), Arc::new(AnnotationKeys::default()));
        dispatcher.submit(update_for(&task));
        assert_eq!(dispatcher.in_flight(), 1);

        let outcomes = dispatcher.drain().await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(store.get("t1").unwrap().state(), TaskState::Started);
    }

    #[tokio::test]
    async fn change_is_recomputed_against_the_stored_task() {
        let store = InMemoryJobStore::new();
        let task = Task::new("t1", "j1");
        let update = update_for(&task);

        // The task was killed after the decision was made.
        let killed = task.with_status(TaskStatus::of(TaskState::KillInitiated));
        store.insert(Job::new("j1"), killed);

        let mut dispatcher = Dispatcher::new(Arc::new(store.clone()), Arc::new(AnnotationKeys::default()));
        dispatcher.submit(update);
        dispatcher.drain().await;

        assert_eq!(store.get("t1").unwrap().state(), TaskState::KillInitiated);
    }

    #[tokio::test]
    async fn missing_task_is_reported_as_not_found() {
        let store = InMemoryJobStore::new();
        let task = Task::new("t1", "j1");

        let mut dispatcher = Dispatcher::new(Arc::new(store), Arc::new(AnnotationKeys::default()));
        dispatcher.submit(update_for(&task));
        let outcome = dispatcher.next_outcome().await.unwrap();

        assert_eq!(outcome.result, Err(StoreError::TaskNotFound("t1".into())));
        assert!(dispatcher.next_outcome().await.is_none());
    }

    #[tokio::test]
    async fn panicking_write_is_reported_as_failed() {
        let inner = InMemoryJobStore::new();
        let task = Task::new("t1", "j1");
        inner.insert(Job::new("j1"), task.clone());
        let update = update_for(&task);
        let seq = update.seq;

        let mut dispatcher = Dispatcher::new(
            Arc::new(PanickingStore { inner: inner.clone() }),
            Arc::new(AnnotationKeys::default()),
        );
        dispatcher.submit(update);
        let outcome = dispatcher.next_outcome().await.expect("outcome for panicked write");

        assert_eq!(outcome.seq, seq);
        assert_eq!(outcome.task_id, "t1");
        assert!(matches!(outcome.result, Err(StoreError::Unavailable(_))));
        assert_eq!(inner.get("t1").unwrap().state(), TaskState::Accepted);
    }
}
