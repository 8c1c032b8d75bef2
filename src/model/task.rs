// src/model/task.rs

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::TaskId;

/// Lifecycle stage of a task.
///
/// Variants are declared in rank order; see [`TaskState::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Accepted,
    Launched,
    StartInitiated,
    Started,
    /// The agent running the task stopped reporting. Only the job manager sets
    /// this state; pod notifications never produce it.
    Disconnected,
    KillInitiated,
    Finished,
}

impl TaskState {
    /// All states, lowest rank first.
    pub const ALL: [TaskState; 7] = [
        TaskState::Accepted,
        TaskState::Launched,
        TaskState::StartInitiated,
        TaskState::Started,
        TaskState::Disconnected,
        TaskState::KillInitiated,
        TaskState::Finished,
    ];

    /// Position of the state in the lifecycle total order.
    ///
    /// A task processed by the engine only ever moves to a strictly higher
    /// rank. Any state added to this enum must be given an explicit rank here.
    pub fn rank(self) -> u8 {
        match self {
            TaskState::Accepted => 0,
            TaskState::Launched => 1,
            TaskState::StartInitiated => 2,
            TaskState::Started => 3,
            TaskState::Disconnected => 4,
            TaskState::KillInitiated => 5,
            TaskState::Finished => 6,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TaskState::Finished
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Accepted => "Accepted",
            TaskState::Launched => "Launched",
            TaskState::StartInitiated => "StartInitiated",
            TaskState::Started => "Started",
            TaskState::Disconnected => "Disconnected",
            TaskState::KillInitiated => "KillInitiated",
            TaskState::Finished => "Finished",
        };
        f.write_str(s)
    }
}

/// One entry of a task's status timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default)]
    pub reason_code: String,
    #[serde(default)]
    pub reason_message: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl TaskStatus {
    /// Create a status stamped with the current wall-clock time.
    pub fn new(
        state: TaskState,
        reason_code: impl Into<String>,
        reason_message: impl Into<String>,
    ) -> Self {
        Self {
            state,
            reason_code: reason_code.into(),
            reason_message: reason_message.into(),
            timestamp_ms: now_ms(),
        }
    }

    /// Status with an empty reason, used for seeding tasks.
    pub fn of(state: TaskState) -> Self {
        Self::new(state, "", "")
    }

    /// Equality on the semantic part of the status (timestamp ignored).
    pub fn same_as(&self, other: &TaskStatus) -> bool {
        self.state == other.state
            && self.reason_code == other.reason_code
            && self.reason_message == other.reason_message
    }
}

/// A named, indexed resource slot allocated on the agent (e.g. an ENI).
///
/// The engine never interprets these beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoLevelResource {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub index: u32,
}

/// One unit of execution belonging to a [`Job`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub job_id: String,
    pub status: TaskStatus,
    /// Past statuses, oldest first. The current status is not included.
    #[serde(default)]
    pub status_history: Vec<TaskStatus>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub task_context: BTreeMap<String, String>,
    #[serde(default)]
    pub two_level_resources: Vec<TwoLevelResource>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, job_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            status: TaskStatus::of(TaskState::Accepted),
            status_history: Vec::new(),
            attributes: BTreeMap::new(),
            task_context: BTreeMap::new(),
            two_level_resources: Vec::new(),
        }
    }

    pub fn state(&self) -> TaskState {
        self.status.state
    }

    /// Return a copy of this task with `status` as the new current status.
    ///
    /// The previous current status is appended to the history; existing
    /// history entries are left untouched.
    pub fn with_status(&self, status: TaskStatus) -> Task {
        let mut next = self.clone();
        let previous = std::mem::replace(&mut next.status, status);
        next.status_history.push(previous);
        next
    }

    /// States this task has been in, including the current one.
    pub fn visited_states(&self) -> impl Iterator<Item = TaskState> + '_ {
        self.status_history
            .iter()
            .map(|s| s.state)
            .chain(std::iter::once(self.status.state))
    }
}

/// Capacity tier of the capacity group a job runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    Flex,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerResources {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory_mb: u32,
    #[serde(default)]
    pub disk_mb: u32,
    #[serde(default)]
    pub network_mbps: u32,
    #[serde(default)]
    pub gpu: u32,
}

/// Immutable workload descriptor, consumed read-only by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub application_name: String,
    #[serde(default)]
    pub capacity_group: String,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub resources: ContainerResources,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            application_name: String::new(),
            capacity_group: String::new(),
            tier: Tier::default(),
            resources: ContainerResources::default(),
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_strictly_increasing_in_declaration_order() {
        for pair in TaskState::ALL.windows(2) {
            assert!(pair[0].rank() < pair[1].rank(), "{:?} vs {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn kill_initiated_ranks_after_started_and_disconnected() {
        assert!(TaskState::Started.rank() < TaskState::KillInitiated.rank());
        assert!(TaskState::Disconnected.rank() < TaskState::KillInitiated.rank());
        assert!(TaskState::KillInitiated.rank() < TaskState::Finished.rank());
    }

    #[test]
    fn with_status_appends_previous_status_to_history() {
        let task = Task::new("task-1", "job-1");
        let launched = task.with_status(TaskStatus::of(TaskState::Launched));
        let started = launched.with_status(TaskStatus::of(TaskState::Started));

        assert_eq!(started.state(), TaskState::Started);
        let history: Vec<_> = started.status_history.iter().map(|s| s.state).collect();
        assert_eq!(history, vec![TaskState::Accepted, TaskState::Launched]);
        // Original is untouched.
        assert!(task.status_history.is_empty());
    }

    #[test]
    fn same_as_ignores_timestamp() {
        let mut a = TaskStatus::new(TaskState::Started, "normal", "running");
        let mut b = a.clone();
        a.timestamp_ms = 1;
        b.timestamp_ms = 2;
        assert!(a.same_as(&b));
        b.reason_message = "other".into();
        assert!(!a.same_as(&b));
    }
}
