// src/replay/mod.rs

//! Offline replay of recorded pod events through a live engine.

pub mod scenario;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::{NotificationProcessor, RunStats};
use crate::errors::{PodsyncError, Result};
use crate::model::{PodEvent, Task};
use crate::source::ChannelPodEventSource;
use crate::store::InMemoryJobStore;

pub use scenario::{load_scenario, Scenario, TaskSeed};

/// Result of a replay run.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub stats: RunStats,
    /// Final tasks, ordered by id.
    pub tasks: Vec<Task>,
}

/// Feed `scenario` through a [`NotificationProcessor`] backed by an
/// in-memory store, and wait until both sources are drained.
///
/// Ctrl-C stops the replay early; in-flight writes still complete.
pub async fn replay(scenario: &Scenario, config: &ConfigFile) -> Result<ReplayReport> {
    let store = InMemoryJobStore::new();
    for seed in &scenario.task {
        let job = scenario
            .job
            .iter()
            .find(|j| j.id == seed.job_id)
            .cloned()
            .ok_or_else(|| {
                PodsyncError::ConfigError(format!(
                    "task '{}' references unknown job '{}'",
                    seed.id, seed.job_id
                ))
            })?;
        store.insert(job, seed.to_task());
    }

    let capacity = config.engine.source_capacity;
    let (direct, direct_tx) = ChannelPodEventSource::new("direct", capacity);
    let (reconciler, reconciler_tx) = ChannelPodEventSource::new("reconciler", capacity);

    let processor = Arc::new(NotificationProcessor::new(
        Arc::new(direct),
        Arc::new(reconciler),
        Arc::new(store.clone()),
        config,
    ));
    processor.enter_active_mode()?;

    let feeders = [
        tokio::spawn(feed("direct", scenario.direct.clone(), direct_tx)),
        tokio::spawn(feed("reconciler", scenario.reconciler.clone(), reconciler_tx)),
    ];

    // Ctrl-C → graceful shutdown.
    let interrupt = {
        let processor = Arc::clone(&processor);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("interrupted; stopping replay");
            if let Err(e) = processor.shutdown().await {
                warn!(error = %e, "shutdown after interrupt failed");
            }
        })
    };

    let stats = processor.wait().await?.unwrap_or_default();
    interrupt.abort();
    for feeder in feeders {
        if let Err(e) = feeder.await {
            warn!(error = %e, "event feeder did not finish cleanly");
        }
    }

    Ok(ReplayReport {
        stats,
        tasks: store.tasks(),
    })
}

async fn feed(name: &'static str, events: Vec<PodEvent>, tx: mpsc::Sender<PodEvent>) {
    let total = events.len();
    for event in events {
        if tx.send(event).await.is_err() {
            debug!(source = name, "source unsubscribed; stopping feed");
            return;
        }
    }
    debug!(source = name, events = total, "all scenario events delivered");
}
