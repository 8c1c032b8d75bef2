use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use podsync::model::{Job, Task};
use podsync::store::{BoxFuture, InMemoryJobStore, JobStore, StoreError, TaskChange, Trigger};

/// One call to `update_task`, as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    pub task_id: String,
    pub trigger: Trigger,
    pub reason: String,
}

enum Injected {
    Fail(StoreError),
    Panic,
}

/// A fake job store that:
/// - records every `update_task` call at submission time
/// - applies changes to an in-memory store
/// - can fail or panic queued writes, or hold writes until released.
#[derive(Clone)]
pub struct RecordingJobStore {
    inner: InMemoryJobStore,
    updates: Arc<Mutex<Vec<RecordedUpdate>>>,
    failures: Arc<Mutex<VecDeque<Injected>>>,
    gate: Arc<Semaphore>,
}

impl RecordingJobStore {
    pub fn new() -> Self {
        Self::with_gate(Semaphore::MAX_PERMITS)
    }

    /// Store whose writes block until [`RecordingJobStore::release`] is called.
    pub fn paused() -> Self {
        Self::with_gate(0)
    }

    fn with_gate(permits: usize) -> Self {
        Self {
            inner: InMemoryJobStore::new(),
            updates: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            gate: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn insert(&self, job: Job, task: Task) {
        self.inner.insert(job, task);
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.inner.get(task_id)
    }

    /// Let `n` held writes through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Fail the next write with `err` (writes are failed in FIFO order).
    pub fn fail_next(&self, err: StoreError) {
        self.failures.lock().unwrap().push_back(Injected::Fail(err));
    }

    /// Panic inside the next write future, after it was submitted.
    pub fn panic_next(&self) {
        self.failures.lock().unwrap().push_back(Injected::Panic);
    }

    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

impl Default for RecordingJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for RecordingJobStore {
    fn find_task(&self, task_id: &str) -> Option<(Job, Task)> {
        self.inner.find_task(task_id)
    }

    fn update_task(
        &self,
        task_id: &str,
        change: TaskChange,
        trigger: Trigger,
        reason: String,
    ) -> BoxFuture<'static, Result<(), StoreError>> {
        self.updates.lock().unwrap().push(RecordedUpdate {
            task_id: task_id.to_string(),
            trigger,
            reason: reason.clone(),
        });

        let failure = self.failures.lock().unwrap().pop_front();
        let gate = Arc::clone(&self.gate);
        let write = self.inner.update_task(task_id, change, trigger, reason);

        Box::pin(async move {
            gate.acquire_owned()
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .forget();
            match failure {
                Some(Injected::Fail(err)) => Err(err),
                Some(Injected::Panic) => panic!("injected store write panic"),
                None => write.await,
            }
        })
    }
}
