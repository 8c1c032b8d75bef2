// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PodsyncError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PodsyncError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.engine, raw.annotations))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_engine(cfg)?;
    validate_domain("node_domain", &cfg.annotations.node_domain)?;
    validate_domain("network_domain", &cfg.annotations.network_domain)?;
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.merge_capacity == 0 {
        return Err(PodsyncError::ConfigError(
            "[engine].merge_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.engine.source_capacity == 0 {
        return Err(PodsyncError::ConfigError(
            "[engine].source_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_domain(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PodsyncError::ConfigError(format!(
            "[annotations].{field} must not be empty"
        )));
    }
    if !value.ends_with('/') {
        return Err(PodsyncError::ConfigError(format!(
            "[annotations].{field} must end with '/' (got '{value}')"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{AnnotationSection, EngineSection};

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }

    #[test]
    fn zero_merge_capacity_is_rejected() {
        let raw = RawConfigFile {
            engine: EngineSection {
                merge_capacity: 0,
                ..EngineSection::default()
            },
            ..RawConfigFile::default()
        };
        match ConfigFile::try_from(raw) {
            Err(PodsyncError::ConfigError(msg)) => assert!(msg.contains("merge_capacity")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn domain_without_trailing_slash_is_rejected() {
        let raw = RawConfigFile {
            annotations: AnnotationSection {
                node_domain: "node.example.com".into(),
                ..AnnotationSection::default()
            },
            ..RawConfigFile::default()
        };
        match ConfigFile::try_from(raw) {
            Err(PodsyncError::ConfigError(msg)) => assert!(msg.contains("node_domain")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }
}
