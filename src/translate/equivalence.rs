// src/translate/equivalence.rs

//! Structural no-op detection between two task versions.

use crate::model::Task;

pub const DIFFERENT_STATUS: &str = "different task status";
pub const DIFFERENT_ATTRIBUTES: &str = "different task attributes";
pub const DIFFERENT_CONTEXT: &str = "different task context";
pub const DIFFERENT_TWO_LEVEL_RESOURCES: &str = "different task two level resources";

/// Human-readable differences between `a` and `b`; empty iff equivalent.
///
/// Status comparison ignores timestamps and history. At most one reason is
/// reported per field group, in a fixed order.
pub fn are_tasks_equivalent(a: &Task, b: &Task) -> Vec<String> {
    let mut differences = Vec::new();

    if !a.status.same_as(&b.status) {
        differences.push(DIFFERENT_STATUS.to_string());
    }
    if a.attributes != b.attributes {
        differences.push(DIFFERENT_ATTRIBUTES.to_string());
    }
    if a.task_context != b.task_context {
        differences.push(DIFFERENT_CONTEXT.to_string());
    }
    if a.two_level_resources != b.two_level_resources {
        differences.push(DIFFERENT_TWO_LEVEL_RESOURCES.to_string());
    }

    differences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskState, TaskStatus, TwoLevelResource};

    fn base() -> Task {
        let mut task = Task::new("task-1", "job-1").with_status(TaskStatus::new(
            TaskState::Started,
            "normal",
            "container running",
        ));
        task.attributes.insert("owner".into(), "team-a".into());
        task.task_context.insert("agent.host".into(), "2.2.2.2".into());
        task
    }

    #[test]
    fn task_is_equivalent_to_itself() {
        let task = base();
        assert!(are_tasks_equivalent(&task, &task).is_empty());
    }

    #[test]
    fn timestamps_alone_do_not_make_a_difference() {
        let a = base();
        let mut b = a.clone();
        b.status.timestamp_ms += 1_000;
        assert!(are_tasks_equivalent(&a, &b).is_empty());
    }

    #[test]
    fn each_field_group_is_reported_once() {
        let a = base();

        let mut b = a.clone();
        b.status.reason_message = "restarted".into();
        assert_eq!(are_tasks_equivalent(&a, &b), vec![DIFFERENT_STATUS]);

        let mut b = a.clone();
        b.attributes.insert("extra".into(), "1".into());
        assert_eq!(are_tasks_equivalent(&a, &b), vec![DIFFERENT_ATTRIBUTES]);

        let mut b = a.clone();
        b.task_context.insert("agent.zone".into(), "us-east-1a".into());
        assert_eq!(are_tasks_equivalent(&a, &b), vec![DIFFERENT_CONTEXT]);

        let mut b = a.clone();
        b.two_level_resources.push(TwoLevelResource {
            name: "eni".into(),
            value: "sg-1".into(),
            index: 0,
        });
        assert_eq!(are_tasks_equivalent(&a, &b), vec![DIFFERENT_TWO_LEVEL_RESOURCES]);
    }

    #[test]
    fn multiple_differences_come_out_in_order() {
        let a = base();
        let mut b = a.clone();
        b.two_level_resources.push(TwoLevelResource {
            name: "eni".into(),
            value: String::new(),
            index: 1,
        });
        b.status.state = TaskState::Finished;

        assert_eq!(
            are_tasks_equivalent(&a, &b),
            vec![DIFFERENT_STATUS, DIFFERENT_TWO_LEVEL_RESOURCES]
        );
    }
}
