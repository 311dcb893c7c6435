//! Plugin connection configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Plugin connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Maximum time to wait for a plugin to answer the opening handshake
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_handshake_timeout"
    )]
    pub handshake_timeout: Duration,

    /// Maximum time to wait for a plugin to answer a single slot call
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_call_timeout"
    )]
    pub call_timeout: Duration,

    /// Configured slot bindings
    #[serde(default)]
    pub slots: Vec<SlotBindingConfig>,
}

/// One configured binding of a slot to a plugin address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotBindingConfig {
    /// Slot name, e.g. "infill_generate"
    pub slot: String,

    /// Plugin connection address
    pub address: String,

    /// Semver range the engine accepts for this slot
    pub version_range: String,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: default_handshake_timeout(),
            call_timeout: default_call_timeout(),
            slots: Vec::new(),
        }
    }
}

impl Validatable for PluginsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.handshake_timeout.as_millis(),
            "handshake_timeout",
            self.domain_name(),
        )?;

        validate_positive(
            self.call_timeout.as_millis(),
            "call_timeout",
            self.domain_name(),
        )?;

        let mut seen = HashSet::new();
        for binding in &self.slots {
            binding.validate()?;
            if !seen.insert(binding.slot.as_str()) {
                return Err(
                    self.validation_error(format!("slot '{}' is bound more than once", binding.slot))
                );
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "plugins"
    }
}

impl Validatable for SlotBindingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.slot, "slot", self.domain_name())?;
        validate_required_string(&self.address, "address", self.domain_name())?;
        validate_required_string(&self.version_range, "version_range", self.domain_name())?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "plugins.slots"
    }
}

// Default value functions
fn default_handshake_timeout() -> Duration {
    Duration::from_millis(500)
}

fn default_call_timeout() -> Duration {
    Duration::from_millis(500)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(slot: &str) -> SlotBindingConfig {
        SlotBindingConfig {
            slot: slot.to_string(),
            address: "ipc://plugin-0".to_string(),
            version_range: "^1.0".to_string(),
        }
    }

    #[test]
    fn test_plugins_config_defaults() {
        let config = PluginsConfig::default();
        assert_eq!(config.handshake_timeout, Duration::from_millis(500));
        assert_eq!(config.call_timeout, Duration::from_millis(500));
        assert!(config.slots.is_empty());
    }

    #[test]
    fn test_plugins_config_validation() {
        let mut config = PluginsConfig::default();
        assert!(config.validate().is_ok());

        // Test invalid timeout
        config.call_timeout = Duration::from_millis(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_slot_binding_rejected() {
        let config = PluginsConfig {
            slots: vec![binding("infill_generate"), binding("infill_generate")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_slot_binding_validation() {
        let mut b = binding("simplify_modify");
        assert!(b.validate().is_ok());

        b.version_range = String::new();
        assert!(b.validate().is_err());
    }

    #[test]
    fn test_timeouts_parse_as_millis() {
        let yaml = "handshake_timeout: 250\ncall_timeout: 1000\n";
        let config: PluginsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.handshake_timeout, Duration::from_millis(250));
        assert_eq!(config.call_timeout, Duration::from_millis(1000));
    }
}
