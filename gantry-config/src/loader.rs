//! Configuration loading and environment variable handling

use crate::domains::GantryConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "GANTRY".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<GantryConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: GantryConfig = serde_yaml::from_str(&content)?;
        log::debug!("Loaded configuration from {}", path.display());

        // Apply environment variable overrides
        self.apply_env_overrides(&mut config)?;

        // Validate all domains
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<GantryConfig> {
        let mut config = GantryConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<GantryConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut GantryConfig) -> ConfigResult<()> {
        self.apply_plugins_overrides(&mut config.plugins)?;
        self.apply_logging_overrides(&mut config.logging)?;

        Ok(())
    }

    /// Apply plugin config overrides
    fn apply_plugins_overrides(
        &self,
        config: &mut crate::domains::plugins::PluginsConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HANDSHAKE_TIMEOUT_MS") {
            let millis: u64 = timeout.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid HANDSHAKE_TIMEOUT_MS: {}", e))
            })?;
            config.handshake_timeout = Duration::from_millis(millis);
        }

        if let Ok(timeout) = self.get_env_var("CALL_TIMEOUT_MS") {
            let millis: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid CALL_TIMEOUT_MS: {}", e)))?;
            config.call_timeout = Duration::from_millis(millis);
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            use std::str::FromStr;
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            use std::str::FromStr;
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
