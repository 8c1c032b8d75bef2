// src/translate/mod.rs

//! Pure translation of orchestrator observations into task changes.
//!
//! Nothing in this module performs IO or touches shared state. The engine
//! calls into it once per event, and once more from inside the store's change
//! function so the final decision is made against the store's own version of
//! the task.

pub mod attributes;
pub mod equivalence;
pub mod result_code;
pub mod state;

use crate::model::{reason, NodeSnapshot, PodSnapshot, Task, TaskState, TaskStatus};

pub use attributes::{resolve_attributes, resolve_network_mode, AnnotationKeys, ContextDelta, NetworkMode};
pub use equivalence::are_tasks_equivalent;
pub use result_code::{DefaultResultCodeResolver, ResultCodeResolver};
pub use state::{admit, compute_status, missing_states, status_for_event, status_for_pod};

/// Message attached to statuses inserted for skipped lifecycle states.
pub const FILLED_IN_MESSAGE: &str = "Filling in missing state";

/// Apply `status` to `current`, producing the next version of the task.
///
/// Returns `None` when the status would not move the task forward (see
/// [`state::admit`]). Otherwise:
/// - skipped states of the launch chain are inserted into the history,
///   stamped with the time of `status`,
/// - `status` becomes the current status,
/// - context derived from the pod and node is merged into `task_context`.
pub fn update_task_status(
    pod: &PodSnapshot,
    status: &TaskStatus,
    node: Option<&NodeSnapshot>,
    current: &Task,
    kill_initiated: bool,
    annotation_keys: &AnnotationKeys,
) -> Option<Task> {
    let admitted = admit(status.clone(), current, kill_initiated)?;

    let mut next = current.clone();
    for state in missing_states(current.state(), admitted.state, pod) {
        let filler = TaskStatus {
            state,
            reason_code: reason::NORMAL.to_string(),
            reason_message: FILLED_IN_MESSAGE.to_string(),
            timestamp_ms: admitted.timestamp_ms,
        };
        next = next.with_status(filler);
    }
    next = next.with_status(admitted);

    resolve_attributes(pod, node, annotation_keys).apply_to(&mut next.task_context);
    Some(next)
}

/// Whether termination of the task was already requested.
///
/// A task that passed through `KillInitiated` is only ever allowed to
/// finish, whatever the pod reports.
pub fn kill_requested(task: &Task) -> bool {
    task.visited_states().any(|s| s == TaskState::KillInitiated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::context_keys as keys;
    use crate::model::{ContainerState, ContainerStatus, PodPhase};
    use crate::translate::attributes::LEGACY_ANNOTATION_IP_ADDRESS;

    fn running_pod() -> PodSnapshot {
        let mut pod = PodSnapshot::new("task-1", PodPhase::Running);
        pod.node_name = Some("i-0123".into());
        pod.containers.push(ContainerStatus {
            name: "main".into(),
            state: ContainerState::Running { started_at_ms: 10 },
        });
        pod.annotations
            .insert(LEGACY_ANNOTATION_IP_ADDRESS.into(), "1.2.3.4".into());
        pod
    }

    fn node() -> NodeSnapshot {
        let mut node = NodeSnapshot {
            name: "i-0123".into(),
            address: "2.2.2.2".into(),
            ..NodeSnapshot::default()
        };
        node.annotations
            .insert("node.titus.netflix.com/ami".into(), "ami123".into());
        node.annotations
            .insert("node.titus.netflix.com/stack".into(), "myStack".into());
        node
    }

    #[test]
    fn started_update_fills_history_and_context() {
        let task = Task::new("task-1", "job-1");
        let started = TaskStatus::of(TaskState::Started);

        let updated = update_task_status(
            &running_pod(),
            &started,
            Some(&node()),
            &task,
            false,
            &AnnotationKeys::default(),
        )
        .expect("task should move forward");

        let past: Vec<_> = updated.status_history.iter().map(|s| s.state).collect();
        assert_eq!(
            past,
            vec![TaskState::Accepted, TaskState::Launched, TaskState::StartInitiated]
        );
        assert_eq!(updated.state(), TaskState::Started);

        let ctx = &updated.task_context;
        assert_eq!(ctx.get(keys::AGENT_HOST).map(String::as_str), Some("2.2.2.2"));
        assert_eq!(ctx.get(keys::CONTAINER_IP).map(String::as_str), Some("1.2.3.4"));
        assert_eq!(ctx.get(keys::AGENT_AMI).map(String::as_str), Some("ami123"));
        assert_eq!(ctx.get(keys::AGENT_STACK).map(String::as_str), Some("myStack"));
    }

    #[test]
    fn filled_in_statuses_share_the_target_timestamp() {
        let task = Task::new("task-1", "job-1");
        let mut started = TaskStatus::of(TaskState::Started);
        started.timestamp_ms = 42;

        let updated = update_task_status(
            &running_pod(),
            &started,
            None,
            &task,
            false,
            &AnnotationKeys::default(),
        )
        .unwrap();

        for filler in &updated.status_history[1..] {
            assert_eq!(filler.timestamp_ms, 42);
            assert_eq!(filler.reason_code, reason::NORMAL);
        }
    }

    #[test]
    fn late_running_observation_does_not_undo_kill() {
        let task = Task::new("task-1", "job-1").with_status(TaskStatus::of(TaskState::KillInitiated));

        let updated = update_task_status(
            &running_pod(),
            &TaskStatus::of(TaskState::Started),
            Some(&node()),
            &task,
            false,
            &AnnotationKeys::default(),
        );

        assert!(updated.is_none());
    }

    #[test]
    fn existing_context_is_preserved() {
        let mut task = Task::new("task-1", "job-1");
        task.task_context.insert("custom".into(), "value".into());

        let updated = update_task_status(
            &running_pod(),
            &TaskStatus::of(TaskState::Started),
            None,
            &task,
            false,
            &AnnotationKeys::default(),
        )
        .unwrap();

        assert_eq!(updated.task_context.get("custom").map(String::as_str), Some("value"));
        assert!(updated.task_context.get(keys::AGENT_HOST).is_none());
    }

    #[test]
    fn kill_requested_looks_at_history() {
        let task = Task::new("task-1", "job-1");
        assert!(!kill_requested(&task));
        let killing = task.with_status(TaskStatus::of(TaskState::KillInitiated));
        assert!(kill_requested(&killing));
        let finished = killing.with_status(TaskStatus::of(TaskState::Finished));
        assert!(kill_requested(&finished));
    }
}
