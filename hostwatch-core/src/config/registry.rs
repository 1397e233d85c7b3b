//! Immutable registry of configured targets

use std::collections::HashMap;

use crate::error::{ConfigError, ConfigResult};

use super::{ConfigProvider, TargetConfig};

/// Ordered, name-keyed set of targets frozen at startup
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<TargetConfig>,
    index: HashMap<String, usize>,
}

impl TargetRegistry {
    /// Builds a registry, preserving the given order
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateTarget`] if two targets share a name,
    /// or [`ConfigError::Invalid`] if a name, host or username is empty.
    pub fn new(targets: Vec<TargetConfig>) -> ConfigResult<Self> {
        let mut index = HashMap::with_capacity(targets.len());
        for (pos, target) in targets.iter().enumerate() {
            for (field, value) in [
                ("name", &target.name),
                ("host", &target.host),
                ("username", &target.username),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::Invalid {
                        field: format!("targets[{pos}].{field}"),
                        reason: "must not be empty".to_string(),
                    });
                }
            }
            if index.insert(target.name.clone(), pos).is_some() {
                return Err(ConfigError::DuplicateTarget(target.name.clone()));
            }
        }
        Ok(Self { targets, index })
    }

    /// Loads and freezes the targets of a provider
    ///
    /// # Errors
    ///
    /// Propagates provider and validation errors.
    pub fn from_provider(provider: &dyn ConfigProvider) -> ConfigResult<Self> {
        let registry = Self::new(provider.load_targets()?)?;
        tracing::info!(
            source = %provider.describe(),
            targets = registry.len(),
            "Target registry loaded"
        );
        Ok(registry)
    }

    /// Looks up a target by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TargetConfig> {
        self.index.get(name).map(|&pos| &self.targets[pos])
    }

    /// Returns true if a target with this name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates targets in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.iter()
    }

    /// Target names in configuration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of targets
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if no targets are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
