// src/source/mod.rs

//! Pod event sources.
//!
//! A source is anything that can hand out a stream of [`PodEvent`]s. The
//! engine subscribes once per activation and unsubscribes by dropping the
//! receiver.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{PodsyncError, Result};
use crate::model::PodEvent;

/// Single-capability event source.
pub trait PodEventSource: Send + Sync {
    /// Name used in logs and subscription errors.
    fn name(&self) -> &str;

    /// Subscribe to the source.
    fn events(&self) -> Result<mpsc::Receiver<PodEvent>>;
}

/// Source fed through an in-process channel.
///
/// Supports exactly one subscription: the receiver is handed out on the
/// first call to [`PodEventSource::events`]; later calls fail.
pub struct ChannelPodEventSource {
    name: String,
    rx: Mutex<Option<mpsc::Receiver<PodEvent>>>,
}

impl ChannelPodEventSource {
    /// Create a source and the sender that feeds it.
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, mpsc::Sender<PodEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let source = Self {
            name: name.into(),
            rx: Mutex::new(Some(rx)),
        };
        (source, tx)
    }
}

impl PodEventSource for ChannelPodEventSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> Result<mpsc::Receiver<PodEvent>> {
        let mut slot = self.rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.take() {
            Some(rx) => {
                debug!(source = %self.name, "subscribed to pod events");
                Ok(rx)
            }
            None => Err(PodsyncError::Subscription {
                source_name: self.name.clone(),
                reason: "channel already subscribed".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PodPhase, PodSnapshot};

    #[tokio::test]
    async fn first_subscription_receives_events() {
        let (source, tx) = ChannelPodEventSource::new("direct", 4);
        let mut rx = source.events().unwrap();

        tx.send(PodEvent::observed(PodSnapshot::new("t1", PodPhase::Pending), None))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().task_id(), "t1");
    }

    #[test]
    fn second_subscription_fails() {
        let (source, _tx) = ChannelPodEventSource::new("reconciler", 1);
        let _rx = source.events().unwrap();

        let err = source.events().unwrap_err();
        assert!(matches!(
            err,
            PodsyncError::Subscription { ref source_name, .. } if source_name == "reconciler"
        ));
    }
}
