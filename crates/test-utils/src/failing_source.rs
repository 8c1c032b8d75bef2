use tokio::sync::mpsc;
use podsync::errors::{PodsyncError, Result};
use podsync::model::PodEvent;
use podsync::source::PodEventSource;

/// An event source whose subscription always fails.
///
/// The error is a plain transport error, not a `Subscription` error, so the
/// caller is expected to attach the source name itself.
pub struct FailingSource {
    name: String,
}

impl FailingSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl PodEventSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> Result<mpsc::Receiver<PodEvent>> {
        Err(PodsyncError::Other(anyhow::anyhow!("connection refused")))
    }
}
