// src/engine/lifecycle.rs

//! Public entry point of the engine.
//!
//! [`NotificationProcessor`] owns the wiring between the two event sources,
//! the job store and the processing loop, and controls when consumption
//! starts and stops.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{PodsyncError, Result};
use crate::model::{NodeSnapshot, PodEvent, PodSnapshot, Task, TaskStatus};
use crate::source::PodEventSource;
use crate::store::JobStore;
use crate::translate::{self, AnnotationKeys, DefaultResultCodeResolver, ResultCodeResolver};

use super::{spawn_merger, CoreProcessor, Dispatcher, RunStats, Runtime};

struct LoopTasks {
    runtime: JoinHandle<Result<RunStats>>,
    forwarders: Vec<JoinHandle<()>>,
}

impl LoopTasks {
    async fn join(self) -> Result<RunStats> {
        let stats = self
            .runtime
            .await
            .map_err(|e| PodsyncError::Runtime(e.to_string()))??;
        for forwarder in self.forwarders {
            if let Err(e) = forwarder.await {
                warn!(error = %e, "pod event forwarder did not stop cleanly");
            }
        }
        Ok(stats)
    }
}

struct Active {
    cancel: CancellationToken,
    /// Taken by whoever awaits the loop.
    tasks: Option<LoopTasks>,
}

/// Reconciles pod notifications from two sources into task state changes.
pub struct NotificationProcessor {
    direct: Arc<dyn PodEventSource>,
    reconciler: Arc<dyn PodEventSource>,
    store: Arc<dyn JobStore>,
    resolver: Arc<dyn ResultCodeResolver>,
    annotation_keys: Arc<AnnotationKeys>,
    merge_capacity: usize,
    active: Mutex<Option<Active>>,
}

impl std::fmt::Debug for NotificationProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationProcessor")
            .field("direct", &self.direct.name())
            .field("reconciler", &self.reconciler.name())
            .field("merge_capacity", &self.merge_capacity)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl NotificationProcessor {
    pub fn new(
        direct: Arc<dyn PodEventSource>,
        reconciler: Arc<dyn PodEventSource>,
        store: Arc<dyn JobStore>,
        config: &ConfigFile,
    ) -> Self {
        Self {
            direct,
            reconciler,
            store,
            resolver: Arc::new(DefaultResultCodeResolver),
            annotation_keys: Arc::new(AnnotationKeys::from_config(&config.annotations)),
            merge_capacity: config.engine.merge_capacity,
            active: Mutex::new(None),
        }
    }

    /// Replace the default result code resolver.
    pub fn with_result_code_resolver(mut self, resolver: Arc<dyn ResultCodeResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Start consuming both sources.
    ///
    /// Calling this while already active is a no-op. If either source can
    /// not be subscribed to, the error is returned and nothing is started.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime; the merger and the
    /// processing loop are spawned onto the current one.
    pub fn enter_active_mode(&self) -> Result<()> {
        let mut active = self.lock_active();
        if active.is_some() {
            debug!("notification processor already active");
            return Ok(());
        }

        let direct = subscribe(self.direct.as_ref())?;
        let reconciler = subscribe(self.reconciler.as_ref())?;

        let cancel = CancellationToken::new();
        let (merged, forwarders) =
            spawn_merger(direct, reconciler, self.merge_capacity, cancel.clone());

        let core = CoreProcessor::new(Arc::clone(&self.annotation_keys), Arc::clone(&self.resolver));
        let dispatcher = Dispatcher::new(Arc::clone(&self.store), Arc::clone(&self.annotation_keys));
        let runtime = Runtime::new(core, dispatcher, Arc::clone(&self.store), merged, cancel.clone());

        *active = Some(Active {
            cancel,
            tasks: Some(LoopTasks {
                runtime: tokio::spawn(runtime.run()),
                forwarders,
            }),
        });

        info!(
            direct = self.direct.name(),
            reconciler = self.reconciler.name(),
            "notification processor active"
        );
        Ok(())
    }

    /// Stop consuming, release both subscriptions and wait for the loop and
    /// its in-flight store writes.
    ///
    /// Returns the loop's counters, or `None` if the processor was not
    /// active. Safe to call more than once.
    pub async fn shutdown(&self) -> Result<Option<RunStats>> {
        let tasks = {
            let mut active = self.lock_active();
            match active.take() {
                None => return Ok(None),
                Some(active) => {
                    active.cancel.cancel();
                    active.tasks
                }
            }
        };

        info!("notification processor shutting down");
        match tasks {
            Some(tasks) => tasks.join().await.map(Some),
            None => Ok(None),
        }
    }

    /// Wait until the loop ends on its own, when both sources are exhausted.
    pub async fn wait(&self) -> Result<Option<RunStats>> {
        let tasks = self.lock_active().as_mut().and_then(|a| a.tasks.take());
        let Some(tasks) = tasks else {
            return Ok(None);
        };

        let stats = tasks.join().await;

        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|a| a.tasks.is_none()) {
            *active = None;
        }
        stats.map(Some)
    }

    pub fn is_active(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|a| !a.cancel.is_cancelled())
    }

    /// Next version of `current` after applying `status` observed on `pod`.
    ///
    /// Pure; does not touch the store or the running loop.
    pub fn update_task_status(
        &self,
        pod: &PodSnapshot,
        status: &TaskStatus,
        node: Option<&NodeSnapshot>,
        current: &Task,
        kill_initiated: bool,
    ) -> Option<Task> {
        translate::update_task_status(pod, status, node, current, kill_initiated, &self.annotation_keys)
    }

    /// Differences between two task versions; empty if equivalent.
    pub fn are_tasks_equivalent(a: &Task, b: &Task) -> Vec<String> {
        translate::are_tasks_equivalent(a, b)
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn subscribe(source: &dyn PodEventSource) -> Result<mpsc::Receiver<PodEvent>> {
    source.events().map_err(|e| {
        error!(source = source.name(), error = %e, "cannot subscribe to pod event source");
        match e {
            PodsyncError::Subscription { .. } => e,
            other => PodsyncError::Subscription {
                source_name: source.name().to_string(),
                reason: other.to_string(),
            },
        }
    })
}
