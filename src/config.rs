//! Weaver configuration.
//!
//! Loaded from YAML files and environment variables.

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "aop.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "AOP_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "AOP";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "AOP_LOG";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Main weaver configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeaverConfig {
    /// Process-wide weaving settings.
    pub weaving: WeavingConfig,
}

/// Process-wide weaving settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeavingConfig {
    /// Initial state of the weaving switch.
    /// Default: true
    pub enabled: bool,
}

impl Default for WeavingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl WeaverConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `aop.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
