// src/engine/merger.rs

//! Merge of the direct and reconciler event streams.
//!
//! One forwarder task per source copies events into a shared bounded channel,
//! tagging each with its origin. Order within a source is preserved; nothing
//! is promised across sources. When the merged channel is full the
//! forwarders stop reading from their upstream, so backpressure reaches the
//! producers.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::model::{EventOrigin, PodEvent, SourcedEvent};

/// Spawn both forwarders.
///
/// The returned receiver yields `None` once both upstreams ended or the
/// token was cancelled.
pub fn spawn_merger(
    direct: mpsc::Receiver<PodEvent>,
    reconciler: mpsc::Receiver<PodEvent>,
    capacity: usize,
    cancel: CancellationToken,
) -> (mpsc::Receiver<SourcedEvent>, Vec<JoinHandle<()>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handles = vec![
        tokio::spawn(forward(EventOrigin::Direct, direct, tx.clone(), cancel.clone())),
        tokio::spawn(forward(EventOrigin::Reconciler, reconciler, tx, cancel)),
    ];

    (rx, handles)
}

async fn forward(
    origin: EventOrigin,
    mut upstream: mpsc::Receiver<PodEvent>,
    merged: mpsc::Sender<SourcedEvent>,
    cancel: CancellationToken,
) {
    debug!(%origin, "pod event forwarder started");

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = upstream.recv() => match next {
                Some(event) => event,
                None => {
                    info!(%origin, "pod event source ended");
                    break;
                }
            },
        };

        let sourced = SourcedEvent { origin, event };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = merged.send(sourced) => {
                if sent.is_err() {
                    debug!(%origin, "merged stream closed; stopping forwarder");
                    break;
                }
            }
        }
    }

    // Dropping the receiver unsubscribes from the source.
    drop(upstream);
    debug!(%origin, "pod event forwarder stopped");
}
