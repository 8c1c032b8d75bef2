// src/translate/result_code.rs

//! Mapping of abnormal pod terminations to task reason codes.

use crate::model::{reason, ContainerState, PodSnapshot, Task};

/// Resolves the reason code for a pod that terminated abnormally.
///
/// Returning `None` lets the translator fall back to a generic
/// [`reason::FAILED`].
pub trait ResultCodeResolver: Send + Sync {
    fn resolve(&self, pod: &PodSnapshot, task: &Task) -> Option<String>;
}

/// Table-driven resolver over well-known pod and container reasons.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResultCodeResolver;

const POD_REASONS: &[(&str, &str)] = &[
    ("Evicted", reason::TRANSIENT_SYSTEM_ERROR),
    ("Preempting", reason::TRANSIENT_SYSTEM_ERROR),
    ("NodeLost", reason::TASK_LOST),
    ("NodeShutdown", reason::TASK_LOST),
    ("Terminated", reason::TASK_LOST),
    ("UnexpectedAdmissionError", reason::LOCAL_SYSTEM_ERROR),
];

const CONTAINER_REASONS: &[(&str, &str)] = &[
    ("OOMKilled", reason::CRASHED),
    ("ContainerCannotRun", reason::LOCAL_SYSTEM_ERROR),
    ("CreateContainerError", reason::LOCAL_SYSTEM_ERROR),
    ("StartError", reason::LOCAL_SYSTEM_ERROR),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<String> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, code)| code.to_string())
}

impl ResultCodeResolver for DefaultResultCodeResolver {
    fn resolve(&self, pod: &PodSnapshot, _task: &Task) -> Option<String> {
        if let Some(code) = lookup(POD_REASONS, &pod.reason) {
            return Some(code);
        }

        match pod.terminated_container().map(|c| &c.state) {
            Some(ContainerState::Terminated {
                exit_code,
                reason: why,
                ..
            }) => lookup(CONTAINER_REASONS, why).or_else(|| {
                (*exit_code != 0).then(|| reason::FAILED.to_string())
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerStatus, PodPhase};

    fn terminated(exit_code: i32, why: &str) -> PodSnapshot {
        let mut pod = PodSnapshot::new("task-1", PodPhase::Failed);
        pod.containers.push(ContainerStatus {
            name: "main".into(),
            state: ContainerState::Terminated {
                exit_code,
                reason: why.into(),
                message: String::new(),
            },
        });
        pod
    }

    #[test]
    fn oom_kill_is_a_crash() {
        let task = Task::new("task-1", "job-1");
        let code = DefaultResultCodeResolver.resolve(&terminated(137, "OOMKilled"), &task);
        assert_eq!(code.as_deref(), Some(reason::CRASHED));
    }

    #[test]
    fn pod_reason_wins_over_container_reason() {
        let task = Task::new("task-1", "job-1");
        let mut pod = terminated(137, "OOMKilled");
        pod.reason = "Evicted".into();
        let code = DefaultResultCodeResolver.resolve(&pod, &task);
        assert_eq!(code.as_deref(), Some(reason::TRANSIENT_SYSTEM_ERROR));
    }

    #[test]
    fn plain_non_zero_exit_is_failed_and_no_container_is_unresolved() {
        let task = Task::new("task-1", "job-1");
        assert_eq!(
            DefaultResultCodeResolver.resolve(&terminated(3, "Error"), &task).as_deref(),
            Some(reason::FAILED)
        );
        let bare = PodSnapshot::new("task-1", PodPhase::Failed);
        assert_eq!(DefaultResultCodeResolver.resolve(&bare, &task), None);
    }
}
