// src/model/event.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NodeSnapshot, PodSnapshot};

/// Lifecycle notification about a single pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PodEvent {
    /// The pod was added or updated.
    Observed {
        current: PodSnapshot,
        #[serde(default)]
        previous: Option<PodSnapshot>,
        #[serde(default)]
        node: Option<NodeSnapshot>,
    },
    /// The pod was deleted from the orchestrator.
    Removed {
        current: PodSnapshot,
        #[serde(default)]
        node: Option<NodeSnapshot>,
    },
    /// The orchestrator could not materialize the pod.
    Error {
        current: PodSnapshot,
        #[serde(default)]
        message: String,
    },
}

impl PodEvent {
    pub fn observed(current: PodSnapshot, node: Option<NodeSnapshot>) -> Self {
        PodEvent::Observed {
            current,
            previous: None,
            node,
        }
    }

    pub fn pod(&self) -> &PodSnapshot {
        match self {
            PodEvent::Observed { current, .. }
            | PodEvent::Removed { current, .. }
            | PodEvent::Error { current, .. } => current,
        }
    }

    pub fn node(&self) -> Option<&NodeSnapshot> {
        match self {
            PodEvent::Observed { node, .. } | PodEvent::Removed { node, .. } => node.as_ref(),
            PodEvent::Error { .. } => None,
        }
    }

    pub fn task_id(&self) -> &str {
        self.pod().task_id()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PodEvent::Observed { .. } => "observed",
            PodEvent::Removed { .. } => "removed",
            PodEvent::Error { .. } => "error",
        }
    }
}

/// Which upstream delivered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventOrigin {
    /// First-hand watch of the orchestrator API.
    Direct,
    /// Periodic resynchronization; may redeliver already processed pods.
    Reconciler,
}

impl fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventOrigin::Direct => f.write_str("direct"),
            EventOrigin::Reconciler => f.write_str("reconciler"),
        }
    }
}

/// A pod event tagged with the source it came from.
#[derive(Debug, Clone)]
pub struct SourcedEvent {
    pub origin: EventOrigin,
    pub event: PodEvent,
}
