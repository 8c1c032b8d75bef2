// src/store/memory.rs

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{BoxFuture, JobStore, StoreError, TaskChange, Trigger};
use crate::model::{Job, Task};

#[derive(Debug, Clone)]
struct Entry {
    job: Job,
    task: Task,
}

/// Process-local job store.
///
/// Cheap to clone; clones share the same tasks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    tasks: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task together with its job.
    pub fn insert(&self, job: Job, task: Task) {
        self.write().insert(task.id.clone(), Entry { job, task });
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.read().get(task_id).map(|e| e.task.clone())
    }

    /// All stored tasks, ordered by id.
    pub fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.read().values().map(|e| e.task.clone()).collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.tasks.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.tasks.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobStore for InMemoryJobStore {
    fn find_task(&self, task_id: &str) -> Option<(Job, Task)> {
        self.read()
            .get(task_id)
            .map(|e| (e.job.clone(), e.task.clone()))
    }

    fn update_task(
        &self,
        task_id: &str,
        change: TaskChange,
        trigger: Trigger,
        reason: String,
    ) -> BoxFuture<'static, Result<(), StoreError>> {
        let tasks = Arc::clone(&self.tasks);
        let task_id = task_id.to_string();

        Box::pin(async move {
            let mut guard = tasks.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            let entry = guard
                .get_mut(&task_id)
                .ok_or_else(|| StoreError::TaskNotFound(task_id.clone()))?;

            match change(&entry.task) {
                Some(next) => {
                    debug!(task = %task_id, %trigger, %reason, state = %next.state(), "task updated");
                    entry.task = next;
                }
                None => debug!(task = %task_id, %trigger, "change function left task unchanged"),
            }
            Ok(())
        })
    }
}
