// src/model/pod.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Orchestrator-reported pod phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
    /// Any phase string this engine does not know about.
    Other(String),
}

impl From<String> for PodPhase {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            "Unknown" => PodPhase::Unknown,
            _ => PodPhase::Other(s),
        }
    }
}

impl From<PodPhase> for String {
    fn from(phase: PodPhase) -> Self {
        phase.to_string()
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodPhase::Pending => f.write_str("Pending"),
            PodPhase::Running => f.write_str("Running"),
            PodPhase::Succeeded => f.write_str("Succeeded"),
            PodPhase::Failed => f.write_str("Failed"),
            PodPhase::Unknown => f.write_str("Unknown"),
            PodPhase::Other(s) => f.write_str(s),
        }
    }
}

/// State of a single container inside a pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ContainerState {
    Waiting {
        #[serde(default)]
        reason: String,
    },
    Running {
        #[serde(default)]
        started_at_ms: u64,
    },
    Terminated {
        exit_code: i32,
        #[serde(default)]
        reason: String,
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    #[serde(flatten)]
    pub state: ContainerState,
}

/// Read-only view over an orchestrator pod record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSnapshot {
    /// Pod name; always equal to the id of the task it runs.
    pub name: String,
    pub phase: PodPhase,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    /// Node the pod was bound to, if scheduled.
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerStatus>,
    /// Set once deletion of the pod was requested.
    #[serde(default)]
    pub deletion_requested: bool,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl PodSnapshot {
    pub fn new(name: impl Into<String>, phase: PodPhase) -> Self {
        Self {
            name: name.into(),
            phase,
            reason: String::new(),
            message: String::new(),
            node_name: None,
            containers: Vec::new(),
            deletion_requested: false,
            annotations: BTreeMap::new(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.name
    }

    pub fn is_scheduled(&self) -> bool {
        self.node_name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Non-empty annotation value for `key`.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// First non-empty annotation among `keys`, in order.
    pub fn first_annotation<K: AsRef<str>>(&self, keys: &[K]) -> Option<&str> {
        keys.iter().find_map(|k| self.annotation(k.as_ref()))
    }

    pub fn has_running_container(&self) -> bool {
        self.containers
            .iter()
            .any(|c| matches!(c.state, ContainerState::Running { .. }))
    }

    pub fn has_waiting_container(&self) -> bool {
        self.containers
            .iter()
            .any(|c| matches!(c.state, ContainerState::Waiting { .. }))
    }

    /// First terminated container, if any.
    pub fn terminated_container(&self) -> Option<&ContainerStatus> {
        self.containers
            .iter()
            .find(|c| matches!(c.state, ContainerState::Terminated { .. }))
    }

    /// Whether a container was ever created for this pod.
    pub fn container_created(&self) -> bool {
        self.containers.iter().any(|c| {
            matches!(
                c.state,
                ContainerState::Running { .. } | ContainerState::Terminated { .. }
            )
        })
    }
}
