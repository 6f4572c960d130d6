//! Engine configuration
//!
//! Copyright (c) 2025 Dtomap Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};

/// What happens to a field whose source is absent from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentPolicy {
    /// Emit `null` and still run the field's filters and the pipeline
    #[default]
    Null,
    /// Leave the field out of the output
    Omit,
}

/// Engine behavior switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store built plans; when off every resolve rebuilds
    pub cache_enabled: bool,
    /// Let an explicit `null` trigger `??` / `| default` as well
    pub null_triggers_default: bool,
    pub absent_fields: AbsentPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            null_triggers_default: false,
            absent_fields: AbsentPolicy::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_yaml::from_str("absent_fields: omit\n").unwrap();
        assert_eq!(config.absent_fields, AbsentPolicy::Omit);
        assert!(config.cache_enabled);
        assert!(!config.null_triggers_default);
    }
}
