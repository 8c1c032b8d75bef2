// src/model/mod.rs

//! Domain objects the reconciliation engine works with.
//!
//! - [`Job`] / [`Task`]: owned by the external job store. The engine only ever
//!   proposes transformed copies of a `Task`.
//! - [`PodSnapshot`] / [`NodeSnapshot`]: read-only views of orchestrator
//!   records, delivered inside a [`PodEvent`].

pub mod event;
pub mod node;
pub mod pod;
pub mod task;

pub use event::{EventOrigin, PodEvent, SourcedEvent};
pub use node::NodeSnapshot;
pub use pod::{ContainerState, ContainerStatus, PodPhase, PodSnapshot};
pub use task::{
    ContainerResources, Job, Task, TaskState, TaskStatus, Tier, TwoLevelResource,
};

/// Canonical task identifier type. Pods are named after the task they run.
pub type TaskId = String;

/// Reason codes attached to a [`TaskStatus`].
pub mod reason {
    pub const NORMAL: &str = "normal";
    pub const FAILED: &str = "failed";
    pub const CRASHED: &str = "crashed";
    pub const KILLED: &str = "killed";
    pub const TASK_LOST: &str = "taskLost";
    pub const TRANSIENT_SYSTEM_ERROR: &str = "transientSystemError";
    pub const LOCAL_SYSTEM_ERROR: &str = "localSystemError";
    pub const POD_CREATION_ERROR: &str = "podCreationError";
}

/// Task context keys written by the attribute resolver.
pub mod context_keys {
    pub const AGENT_HOST: &str = "agent.host";
    pub const AGENT_INSTANCE_ID: &str = "agent.instanceId";
    pub const AGENT_AMI: &str = "agent.ami";
    pub const AGENT_STACK: &str = "agent.stack";
    pub const AGENT_ZONE: &str = "agent.zone";
    pub const CONTAINER_IP: &str = "task.containerIp";
    pub const CONTAINER_IPV4: &str = "task.containerIPv4";
    pub const CONTAINER_IPV6: &str = "task.containerIPv6";
    pub const TRANSITION_IPV4: &str = "task.transitionIPv4";
    pub const NETWORK_MODE: &str = "task.networkMode";
}
