// src/config/model.rs

use serde::{Deserialize, Serialize};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [engine]
/// merge_capacity = 64
/// source_capacity = 64
///
/// [annotations]
/// node_domain = "node.titus.netflix.com/"
/// network_domain = "network.netflix.com/"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub annotations: AnnotationSection,
}

/// Validated configuration that the rest of the crate consumes.
///
/// You obtain one via `ConfigFile::try_from(raw)` (or `load_and_validate`).
/// Built once at startup and then only passed around by reference.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub annotations: AnnotationSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(engine: EngineSection, annotations: AnnotationSection) -> Self {
        Self {
            engine,
            annotations,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(EngineSection::default(), AnnotationSection::default())
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSection {
    /// Capacity of the merged event channel. When full, both upstream
    /// forwarders stop pulling from their sources.
    #[serde(default = "default_capacity")]
    pub merge_capacity: usize,

    /// Capacity of each channel-backed event source.
    #[serde(default = "default_capacity")]
    pub source_capacity: usize,
}

fn default_capacity() -> usize {
    64
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            merge_capacity: default_capacity(),
            source_capacity: default_capacity(),
        }
    }
}

/// `[annotations]` section.
///
/// Domain prefixes under which node metadata and structured pod network
/// annotations are published.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnnotationSection {
    /// Prefix for node labels/annotations, e.g. `<node_domain>ami`.
    #[serde(default = "default_node_domain")]
    pub node_domain: String,

    /// Prefix for structured pod network annotations,
    /// e.g. `<network_domain>network-mode`.
    #[serde(default = "default_network_domain")]
    pub network_domain: String,
}

fn default_node_domain() -> String {
    "node.titus.netflix.com/".to_string()
}

fn default_network_domain() -> String {
    "network.netflix.com/".to_string()
}

impl Default for AnnotationSection {
    fn default() -> Self {
        Self {
            node_domain: default_node_domain(),
            network_domain: default_network_domain(),
        }
    }
}
