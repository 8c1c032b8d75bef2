// src/model/node.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Read-only view over an orchestrator node record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSnapshot {
    #[serde(default)]
    pub name: String,
    /// Primary address of the agent.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl NodeSnapshot {
    /// Non-empty metadata value for `key`; annotations win over labels.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        [&self.annotations, &self.labels]
            .into_iter()
            .filter_map(|m| m.get(key))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}
