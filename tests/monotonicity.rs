// tests/monotonicity.rs

use proptest::prelude::*;
use podsync::model::{PodPhase, Task, TaskState, TaskStatus};
use podsync::translate::{are_tasks_equivalent, update_task_status, AnnotationKeys};
use podsync_test_utils::builders::{PodBuilder, TaskBuilder};

fn state_strategy() -> impl Strategy<Value = TaskState> {
    prop::sample::select(TaskState::ALL.to_vec())
}

fn phase_strategy() -> impl Strategy<Value = PodPhase> {
    prop::sample::select(vec![
        PodPhase::Pending,
        PodPhase::Running,
        PodPhase::Succeeded,
        PodPhase::Failed,
        PodPhase::Unknown,
    ])
}

fn task_in(state: TaskState) -> Task {
    let builder = TaskBuilder::new("task-1", "job-1");
    if state == TaskState::Accepted {
        builder.build()
    } else {
        builder.in_state(state).build()
    }
}

proptest! {
    #[test]
    fn never_moves_to_equal_or_lower_rank(
        current in state_strategy(),
        candidate in state_strategy(),
        phase in phase_strategy(),
        kill_initiated in any::<bool>(),
    ) {
        let pod = PodBuilder::new("task-1", phase).on_node("i-0123").build();
        let task = task_in(current);

        let updated = update_task_status(
            &pod,
            &TaskStatus::of(candidate),
            None,
            &task,
            kill_initiated,
            &AnnotationKeys::default(),
        );

        if candidate.rank() <= current.rank() {
            prop_assert!(updated.is_none());
        }
        if let Some(next) = updated {
            prop_assert!(next.state().rank() > current.rank());
            prop_assert!(!kill_initiated || next.state() == TaskState::Finished);

            // History ranks strictly increase and end below the current state.
            let ranks: Vec<u8> = next.visited_states().map(|s| s.rank()).collect();
            prop_assert!(ranks.windows(2).all(|w| w[0] < w[1]), "ranks {:?}", ranks);
        }
    }

    #[test]
    fn every_task_is_equivalent_to_itself(
        state in state_strategy(),
        attrs in proptest::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..4),
    ) {
        let mut task = task_in(state);
        task.attributes = attrs;
        prop_assert!(are_tasks_equivalent(&task, &task).is_empty());
    }
}
