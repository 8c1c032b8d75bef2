use std::sync::Arc;

use tokio::sync::mpsc;
use podsync::config::ConfigFile;
use podsync::engine::{NotificationProcessor, RunStats};
use podsync::model::{Job, PodEvent, Task};
use podsync::source::ChannelPodEventSource;

use crate::fake_store::RecordingJobStore;

/// A `NotificationProcessor` wired to two channel sources and a
/// [`RecordingJobStore`].
pub struct Harness {
    pub processor: NotificationProcessor,
    pub store: RecordingJobStore,
    direct: Option<mpsc::Sender<PodEvent>>,
    reconciler: Option<mpsc::Sender<PodEvent>>,
}

impl Harness {
    pub fn new(store: RecordingJobStore) -> Self {
        Self::with_config(store, &ConfigFile::default())
    }

    pub fn with_config(store: RecordingJobStore, config: &ConfigFile) -> Self {
        let capacity = config.engine.source_capacity;
        let (direct, direct_tx) = ChannelPodEventSource::new("direct", capacity);
        let (reconciler, reconciler_tx) = ChannelPodEventSource::new("reconciler", capacity);
        let processor = NotificationProcessor::new(
            Arc::new(direct),
            Arc::new(reconciler),
            Arc::new(store.clone()),
            config,
        );
        Self {
            processor,
            store,
            direct: Some(direct_tx),
            reconciler: Some(reconciler_tx),
        }
    }

    /// Seed the store with `task` and a matching job.
    pub fn with_task(self, task: Task) -> Self {
        self.store.insert(Job::new(task.job_id.clone()), task);
        self
    }

    pub async fn send_direct(&self, event: PodEvent) {
        let tx = self.direct.as_ref().expect("direct source already closed");
        tx.send(event).await.expect("direct source unsubscribed");
    }

    pub async fn send_reconciler(&self, event: PodEvent) {
        let tx = self.reconciler.as_ref().expect("reconciler source already closed");
        tx.send(event).await.expect("reconciler source unsubscribed");
    }

    /// End both sources and wait for the loop to drain.
    pub async fn finish(&mut self) -> RunStats {
        self.direct.take();
        self.reconciler.take();
        self.processor
            .wait()
            .await
            .expect("processing loop failed")
            .expect("processor was not active")
    }
}
