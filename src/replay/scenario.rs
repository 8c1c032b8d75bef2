// src/replay/scenario.rs

//! Recorded pod event scenarios.
//!
//! ```toml
//! [[job]]
//! id = "job-1"
//!
//! [[task]]
//! id = "task-1"
//! job_id = "job-1"
//! state = "Accepted"
//!
//! [[direct]]
//! kind = "observed"
//! current = { name = "task-1", phase = "Pending", node_name = "i-0123" }
//!
//! [[reconciler]]
//! kind = "removed"
//! current = { name = "task-1", phase = "Running" }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{PodsyncError, Result};
use crate::model::{Job, PodEvent, Task, TaskState, TaskStatus};

/// Initial state of a task before replay.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSeed {
    pub id: String,
    pub job_id: String,
    #[serde(default = "default_seed_state")]
    pub state: TaskState,
    #[serde(default)]
    pub task_context: BTreeMap<String, String>,
}

fn default_seed_state() -> TaskState {
    TaskState::Accepted
}

impl TaskSeed {
    pub fn to_task(&self) -> Task {
        let mut task = Task::new(self.id.clone(), self.job_id.clone());
        if self.state != TaskState::Accepted {
            task = task.with_status(TaskStatus::of(self.state));
        }
        task.task_context = self.task_context.clone();
        task
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub job: Vec<Job>,
    #[serde(default)]
    pub task: Vec<TaskSeed>,
    /// Events delivered by the direct source, in order.
    #[serde(default)]
    pub direct: Vec<PodEvent>,
    /// Events delivered by the reconciler source, in order.
    #[serde(default)]
    pub reconciler: Vec<PodEvent>,
}

impl Scenario {
    pub fn parse(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Events may name tasks that are not seeded; those exercise the
    /// not-found path. Seeds themselves must be consistent.
    fn validate(&self) -> Result<()> {
        let mut job_ids = HashSet::new();
        for job in &self.job {
            if !job_ids.insert(job.id.as_str()) {
                return Err(PodsyncError::ConfigError(format!(
                    "scenario declares job '{}' more than once",
                    job.id
                )));
            }
        }

        let mut task_ids = HashSet::new();
        for seed in &self.task {
            if !task_ids.insert(seed.id.as_str()) {
                return Err(PodsyncError::ConfigError(format!(
                    "scenario declares task '{}' more than once",
                    seed.id
                )));
            }
            if !job_ids.contains(seed.job_id.as_str()) {
                return Err(PodsyncError::ConfigError(format!(
                    "task '{}' references unknown job '{}'",
                    seed.id, seed.job_id
                )));
            }
        }

        Ok(())
    }

    pub fn event_count(&self) -> usize {
        self.direct.len() + self.reconciler.len()
    }
}

pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario> {
    let contents = fs::read_to_string(path.as_ref())?;
    Scenario::parse(&contents)
}
