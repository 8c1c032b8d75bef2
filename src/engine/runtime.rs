// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::Result;
use crate::model::SourcedEvent;
use crate::store::JobStore;

use super::core::CoreProcessor;
use super::dispatcher::Dispatcher;
use super::{CoreCommand, DispatchOutcome, RunStats};

/// Drives the reconciliation core in response to merged pod events, and
/// delegates store writes to the [`Dispatcher`].
///
/// This is a pure IO shell around [`CoreProcessor`], which contains all the
/// decision logic. Events are handled strictly one at a time; store writes
/// proceed concurrently and report back through the dispatcher.
pub struct Runtime {
    core: CoreProcessor,
    dispatcher: Dispatcher,
    store: Arc<dyn JobStore>,
    events: mpsc::Receiver<SourcedEvent>,
    cancel: CancellationToken,
    stats: RunStats,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("dispatcher", &self.dispatcher)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        core: CoreProcessor,
        dispatcher: Dispatcher,
        store: Arc<dyn JobStore>,
        events: mpsc::Receiver<SourcedEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            core,
            dispatcher,
            store,
            events,
            cancel,
            stats: RunStats::default(),
        }
    }

    /// Main event loop.
    ///
    /// - Consumes merged events until both sources end or `cancel` fires.
    /// - Feeds write completions back into the core.
    /// - On exit, waits for every in-flight write; none is aborted.
    pub async fn run(mut self) -> Result<RunStats> {
        info!("pod event processing loop started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("shutdown requested; stopping event processing");
                    break;
                }
                Some(outcome) = self.dispatcher.next_outcome(), if self.dispatcher.in_flight() > 0 => {
                    self.on_outcome(outcome);
                }
                next = self.events.recv() => match next {
                    Some(sourced) => self.handle_event(sourced),
                    None => {
                        info!("all pod event sources ended");
                        break;
                    }
                },
            }
        }

        for outcome in self.dispatcher.drain().await {
            self.on_outcome(outcome);
        }

        info!(
            received = self.stats.received,
            dispatched = self.stats.dispatched,
            dropped = self.stats.dropped,
            failed_writes = self.stats.failed_writes,
            "pod event processing loop finished"
        );
        Ok(self.stats)
    }

    fn handle_event(&mut self, sourced: SourcedEvent) {
        self.stats.received += 1;
        debug!(
            task = %sourced.event.task_id(),
            origin = %sourced.origin,
            kind = sourced.event.kind(),
            phase = %sourced.event.pod().phase,
            "pod event received"
        );

        let stored = self
            .store
            .find_task(sourced.event.task_id())
            .map(|(_job, task)| task);

        let step = self.core.step(&sourced, stored.as_ref());
        for command in step.commands {
            match command {
                CoreCommand::Dispatch(update) => {
                    self.stats.dispatched += 1;
                    self.dispatcher.submit(update);
                }
                CoreCommand::Drop { task_id, reason } => {
                    self.stats.dropped += 1;
                    debug!(task = %task_id, ?reason, "pod event dropped");
                }
            }
        }
    }

    fn on_outcome(&mut self, outcome: DispatchOutcome) {
        if outcome.result.is_err() {
            self.stats.failed_writes += 1;
        }
        self.core.on_outcome(&outcome);
    }
}
