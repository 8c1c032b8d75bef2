// src/translate/state.rs

//! Pod snapshot → candidate task status.
//!
//! Translation happens in two steps:
//! 1. [`status_for_event`] maps the orchestrator view to a candidate status,
//!    with no knowledge of ordering.
//! 2. [`admit`] applies the forward-only guard against the current task.
//!
//! [`compute_status`] does both.

use tracing::debug;

use crate::model::{reason, ContainerState, PodEvent, PodPhase, PodSnapshot, Task, TaskState, TaskStatus};
use crate::translate::result_code::ResultCodeResolver;

/// Candidate status for a pod add/update, or `None` if the phase carries no
/// actionable information.
pub fn status_for_pod(
    pod: &PodSnapshot,
    task: &Task,
    resolver: &dyn ResultCodeResolver,
) -> Option<TaskStatus> {
    match &pod.phase {
        PodPhase::Pending => pending_status(pod),
        PodPhase::Running => {
            if pod.has_running_container() || pod.containers.is_empty() {
                Some(TaskStatus::new(TaskState::Started, reason::NORMAL, "container running"))
            } else {
                debug!(task = %pod.name, "pod running without a running container; skipping");
                None
            }
        }
        PodPhase::Succeeded => Some(TaskStatus::new(
            TaskState::Finished,
            reason::NORMAL,
            non_empty_or(&pod.message, "container completed successfully"),
        )),
        PodPhase::Failed => Some(failed_status(pod, task, resolver)),
        PodPhase::Unknown | PodPhase::Other(_) => {
            debug!(task = %pod.name, phase = %pod.phase, "no task state for pod phase");
            None
        }
    }
}

fn pending_status(pod: &PodSnapshot) -> Option<TaskStatus> {
    if !pod.is_scheduled() {
        return None;
    }
    let waiting = pod.containers.iter().find_map(|c| match &c.state {
        ContainerState::Waiting { reason } => Some(reason.as_str()),
        _ => None,
    });
    match waiting {
        Some(why) => Some(TaskStatus::new(
            TaskState::StartInitiated,
            reason::NORMAL,
            non_empty_or(why, "container creation in progress"),
        )),
        None => Some(TaskStatus::new(
            TaskState::Launched,
            reason::NORMAL,
            "pod scheduled on a node",
        )),
    }
}

fn failed_status(pod: &PodSnapshot, task: &Task, resolver: &dyn ResultCodeResolver) -> TaskStatus {
    let code = resolver
        .resolve(pod, task)
        .unwrap_or_else(|| reason::FAILED.to_string());

    let message = if !pod.container_created() {
        match pod.reason.as_str() {
            "" => "pod failed before a container was created".to_string(),
            why => format!("pod failed before a container was created: {why}"),
        }
    } else {
        match pod.terminated_container().map(|c| &c.state) {
            Some(ContainerState::Terminated {
                exit_code,
                reason: why,
                message,
            }) => {
                let detail = [why.as_str(), message.as_str(), pod.message.as_str()]
                    .into_iter()
                    .find(|s| !s.is_empty())
                    .unwrap_or("no details");
                format!("container exited with code {exit_code}: {detail}")
            }
            _ => non_empty_or(&pod.message, "pod failed"),
        }
    };

    TaskStatus::new(TaskState::Finished, code, message)
}

/// Candidate status for any pod event.
pub fn status_for_event(
    event: &PodEvent,
    task: &Task,
    resolver: &dyn ResultCodeResolver,
) -> Option<TaskStatus> {
    match event {
        PodEvent::Observed { current, .. } => status_for_pod(current, task, resolver),
        PodEvent::Removed { current, .. } => match current.phase {
            PodPhase::Succeeded | PodPhase::Failed => status_for_pod(current, task, resolver),
            _ if task.state() == TaskState::KillInitiated || current.deletion_requested => Some(
                TaskStatus::new(TaskState::Finished, reason::KILLED, "pod deleted"),
            ),
            _ => Some(TaskStatus::new(
                TaskState::Finished,
                reason::TASK_LOST,
                "pod removed from the orchestrator before it terminated",
            )),
        },
        PodEvent::Error { message, .. } => Some(TaskStatus::new(
            TaskState::Finished,
            reason::POD_CREATION_ERROR,
            non_empty_or(message, "pod could not be created"),
        )),
    }
}

/// Forward-only guard.
///
/// Returns the candidate only if it ranks strictly above the task's current
/// state. When `kill_initiated` is set, only a terminal candidate is
/// accepted.
pub fn admit(candidate: TaskStatus, current: &Task, kill_initiated: bool) -> Option<TaskStatus> {
    let from = current.state();
    let to = candidate.state;

    if to.rank() <= from.rank() {
        debug!(task = %current.id, %from, %to, "candidate does not move task forward; dropping");
        return None;
    }
    if kill_initiated && !to.is_terminal() {
        debug!(task = %current.id, %from, %to, "termination in progress; only Finished is accepted");
        return None;
    }
    Some(candidate)
}

/// Candidate status for `event`, guarded against `current`.
pub fn compute_status(
    event: &PodEvent,
    current: &Task,
    kill_initiated: bool,
    resolver: &dyn ResultCodeResolver,
) -> Option<TaskStatus> {
    let candidate = status_for_event(event, current, resolver)?;
    admit(candidate, current, kill_initiated)
}

/// States skipped between `from` and `to` that should be recorded in the
/// history so it reads as a complete lifecycle.
///
/// Only the launch chain up to `Started` is ever filled in, and a direct jump
/// to `Finished` is back-filled only when a container was actually created.
pub fn missing_states(from: TaskState, to: TaskState, pod: &PodSnapshot) -> Vec<TaskState> {
    const CHAIN: [TaskState; 3] = [TaskState::Launched, TaskState::StartInitiated, TaskState::Started];

    let upper = if to.rank() <= TaskState::Started.rank() {
        to.rank()
    } else if to.is_terminal() && pod.container_created() {
        TaskState::Started.rank() + 1
    } else {
        return Vec::new();
    };

    CHAIN
        .into_iter()
        .filter(|s| s.rank() > from.rank() && s.rank() < upper)
        .collect()
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerStatus, NodeSnapshot};
    use crate::translate::result_code::DefaultResultCodeResolver;

    fn task_in(state: TaskState) -> Task {
        let task = Task::new("task-1", "job-1");
        if state == TaskState::Accepted {
            task
        } else {
            task.with_status(TaskStatus::of(state))
        }
    }

    fn pod(phase: PodPhase) -> PodSnapshot {
        PodSnapshot::new("task-1", phase)
    }

    fn with_container(mut pod: PodSnapshot, state: ContainerState) -> PodSnapshot {
        pod.containers.push(ContainerStatus {
            name: "main".into(),
            state,
        });
        pod
    }

    fn candidate(pod: &PodSnapshot, task: &Task) -> Option<TaskState> {
        status_for_pod(pod, task, &DefaultResultCodeResolver).map(|s| s.state)
    }

    #[test]
    fn pending_pod_maps_through_the_launch_chain() {
        let task = task_in(TaskState::Accepted);

        let unscheduled = pod(PodPhase::Pending);
        assert_eq!(candidate(&unscheduled, &task), None);

        let mut scheduled = pod(PodPhase::Pending);
        scheduled.node_name = Some("node-a".into());
        assert_eq!(candidate(&scheduled, &task), Some(TaskState::Launched));

        let creating = with_container(
            scheduled,
            ContainerState::Waiting {
                reason: "ContainerCreating".into(),
            },
        );
        assert_eq!(candidate(&creating, &task), Some(TaskState::StartInitiated));
    }

    #[test]
    fn running_and_terminal_phases() {
        let task = task_in(TaskState::Accepted);
        let running = with_container(pod(PodPhase::Running), ContainerState::Running { started_at_ms: 1 });
        assert_eq!(candidate(&running, &task), Some(TaskState::Started));

        let done = pod(PodPhase::Succeeded);
        let status = status_for_pod(&done, &task, &DefaultResultCodeResolver).unwrap();
        assert_eq!(status.state, TaskState::Finished);
        assert_eq!(status.reason_code, reason::NORMAL);
    }

    #[test]
    fn unknown_phase_yields_no_candidate() {
        let task = task_in(TaskState::Started);
        assert_eq!(candidate(&pod(PodPhase::Unknown), &task), None);
        assert_eq!(candidate(&pod(PodPhase::Other("Evicting".into())), &task), None);
    }

    #[test]
    fn failed_without_container_says_so() {
        let task = task_in(TaskState::Accepted);
        let status = status_for_pod(&pod(PodPhase::Failed), &task, &DefaultResultCodeResolver).unwrap();
        assert_eq!(status.state, TaskState::Finished);
        assert_eq!(status.reason_code, reason::FAILED);
        assert!(status.reason_message.contains("before a container was created"));
    }

    #[test]
    fn failed_container_reports_exit_code() {
        let task = task_in(TaskState::Started);
        let failed = with_container(
            pod(PodPhase::Failed),
            ContainerState::Terminated {
                exit_code: 137,
                reason: "OOMKilled".into(),
                message: String::new(),
            },
        );
        let status = status_for_pod(&failed, &task, &DefaultResultCodeResolver).unwrap();
        assert_eq!(status.reason_code, reason::CRASHED);
        assert_eq!(status.reason_message, "container exited with code 137: OOMKilled");
    }

    #[test]
    fn guard_rejects_equal_and_lower_ranks() {
        let started = task_in(TaskState::Started);
        assert!(admit(TaskStatus::of(TaskState::Started), &started, false).is_none());
        assert!(admit(TaskStatus::of(TaskState::Launched), &started, false).is_none());
        assert!(admit(TaskStatus::of(TaskState::Finished), &started, false).is_some());
    }

    #[test]
    fn running_pod_never_moves_kill_initiated_task_back() {
        let killing = task_in(TaskState::KillInitiated);
        let running = with_container(pod(PodPhase::Running), ContainerState::Running { started_at_ms: 1 });
        let event = PodEvent::observed(running, Some(NodeSnapshot::default()));
        assert!(compute_status(&event, &killing, false, &DefaultResultCodeResolver).is_none());
    }

    #[test]
    fn kill_initiated_guard_only_admits_finished() {
        let launched = task_in(TaskState::Launched);
        assert!(admit(TaskStatus::of(TaskState::Started), &launched, true).is_none());
        assert!(admit(TaskStatus::of(TaskState::Finished), &launched, true).is_some());
    }

    #[test]
    fn removed_pod_is_killed_or_lost() {
        let resolver = DefaultResultCodeResolver;
        let running = pod(PodPhase::Running);

        let removed = PodEvent::Removed {
            current: running.clone(),
            node: None,
        };
        let lost = status_for_event(&removed, &task_in(TaskState::Started), &resolver).unwrap();
        assert_eq!(lost.reason_code, reason::TASK_LOST);

        let killed = status_for_event(&removed, &task_in(TaskState::KillInitiated), &resolver).unwrap();
        assert_eq!(killed.reason_code, reason::KILLED);

        let mut deleting = running;
        deleting.deletion_requested = true;
        let removed = PodEvent::Removed {
            current: deleting,
            node: None,
        };
        let killed = status_for_event(&removed, &task_in(TaskState::Started), &resolver).unwrap();
        assert_eq!(killed.reason_code, reason::KILLED);
    }

    #[test]
    fn error_event_finishes_with_creation_error() {
        let event = PodEvent::Error {
            current: pod(PodPhase::Pending),
            message: "admission denied".into(),
        };
        let status = status_for_event(&event, &task_in(TaskState::Accepted), &DefaultResultCodeResolver).unwrap();
        assert_eq!(status.state, TaskState::Finished);
        assert_eq!(status.reason_code, reason::POD_CREATION_ERROR);
        assert_eq!(status.reason_message, "admission denied");
    }

    #[test]
    fn missing_states_fill_the_launch_chain() {
        let bare = pod(PodPhase::Running);
        assert_eq!(
            missing_states(TaskState::Accepted, TaskState::Started, &bare),
            vec![TaskState::Launched, TaskState::StartInitiated]
        );
        assert_eq!(
            missing_states(TaskState::Launched, TaskState::Started, &bare),
            vec![TaskState::StartInitiated]
        );
        assert!(missing_states(TaskState::Accepted, TaskState::Launched, &bare).is_empty());
    }

    #[test]
    fn missing_states_for_finished_depend_on_container_creation() {
        let never_ran = pod(PodPhase::Failed);
        assert!(missing_states(TaskState::Accepted, TaskState::Finished, &never_ran).is_empty());

        let ran = with_container(
            pod(PodPhase::Succeeded),
            ContainerState::Terminated {
                exit_code: 0,
                reason: "Completed".into(),
                message: String::new(),
            },
        );
        assert_eq!(
            missing_states(TaskState::Launched, TaskState::Finished, &ran),
            vec![TaskState::StartInitiated, TaskState::Started]
        );
        assert!(missing_states(TaskState::KillInitiated, TaskState::Finished, &ran).is_empty());
    }
}
