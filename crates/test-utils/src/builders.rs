use podsync::config::{AnnotationSection, ConfigFile, EngineSection, RawConfigFile};
use podsync::model::{
    ContainerState, ContainerStatus, NodeSnapshot, PodEvent, PodPhase, PodSnapshot, Task,
    TaskState, TaskStatus, TwoLevelResource,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                engine: EngineSection::default(),
                annotations: AnnotationSection::default(),
            },
        }
    }

    pub fn merge_capacity(mut self, capacity: usize) -> Self {
        self.config.engine.merge_capacity = capacity;
        self
    }

    pub fn source_capacity(mut self, capacity: usize) -> Self {
        self.config.engine.source_capacity = capacity;
        self
    }

    pub fn node_domain(mut self, domain: &str) -> Self {
        self.config.annotations.node_domain = domain.to_string();
        self
    }

    pub fn network_domain(mut self, domain: &str) -> Self {
        self.config.annotations.network_domain = domain.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PodSnapshot`. The pod is named after the task it runs.
pub struct PodBuilder {
    pod: PodSnapshot,
}

impl PodBuilder {
    pub fn new(task_id: &str, phase: PodPhase) -> Self {
        Self {
            pod: PodSnapshot::new(task_id, phase),
        }
    }

    pub fn pending(task_id: &str) -> Self {
        Self::new(task_id, PodPhase::Pending)
    }

    /// Running pod bound to a node, with one running container.
    pub fn running(task_id: &str) -> Self {
        Self::new(task_id, PodPhase::Running)
            .on_node("i-0123")
            .running_container("main")
    }

    pub fn failed(task_id: &str) -> Self {
        Self::new(task_id, PodPhase::Failed)
    }

    pub fn succeeded(task_id: &str) -> Self {
        Self::new(task_id, PodPhase::Succeeded)
    }

    pub fn on_node(mut self, node: &str) -> Self {
        self.pod.node_name = Some(node.to_string());
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.pod.reason = reason.to_string();
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.pod.message = message.to_string();
        self
    }

    pub fn waiting_container(mut self, name: &str, reason: &str) -> Self {
        self.pod.containers.push(ContainerStatus {
            name: name.to_string(),
            state: ContainerState::Waiting {
                reason: reason.to_string(),
            },
        });
        self
    }

    pub fn running_container(mut self, name: &str) -> Self {
        self.pod.containers.push(ContainerStatus {
            name: name.to_string(),
            state: ContainerState::Running { started_at_ms: 1 },
        });
        self
    }

    pub fn terminated_container(mut self, name: &str, exit_code: i32, reason: &str) -> Self {
        self.pod.containers.push(ContainerStatus {
            name: name.to_string(),
            state: ContainerState::Terminated {
                exit_code,
                reason: reason.to_string(),
                message: String::new(),
            },
        });
        self
    }

    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.pod.annotations.insert(key.to_string(), value.to_string());
        self
    }

    pub fn deletion_requested(mut self) -> Self {
        self.pod.deletion_requested = true;
        self
    }

    pub fn build(self) -> PodSnapshot {
        self.pod
    }

    /// Add/update event for this pod.
    pub fn observed(self, node: Option<NodeSnapshot>) -> PodEvent {
        PodEvent::observed(self.pod, node)
    }

    pub fn removed(self) -> PodEvent {
        PodEvent::Removed {
            current: self.pod,
            node: None,
        }
    }
}

/// Builder for `NodeSnapshot`.
pub struct NodeBuilder {
    node: NodeSnapshot,
}

impl NodeBuilder {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            node: NodeSnapshot {
                name: name.to_string(),
                address: address.to_string(),
                ..NodeSnapshot::default()
            },
        }
    }

    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.node.annotations.insert(key.to_string(), value.to_string());
        self
    }

    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.node.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> NodeSnapshot {
        self.node
    }
}

/// Builder for `Task`, starting in `Accepted`.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(task_id: &str, job_id: &str) -> Self {
        Self {
            task: Task::new(task_id, job_id),
        }
    }

    /// Move the task to `state`, recording the previous status in history.
    pub fn in_state(mut self, state: TaskState) -> Self {
        self.task = self.task.with_status(TaskStatus::of(state));
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.task.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn context(mut self, key: &str, value: &str) -> Self {
        self.task.task_context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn two_level_resource(mut self, name: &str, value: &str, index: u32) -> Self {
        self.task.two_level_resources.push(TwoLevelResource {
            name: name.to_string(),
            value: value.to_string(),
            index,
        });
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
