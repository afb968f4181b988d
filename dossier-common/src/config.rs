//! Configuration file resolution and loading
//!
//! Configuration is located following a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file in the platform config directory
//! 4. Compiled defaults (fallback)
//!
//! A file named explicitly (priority 1 or 2) must load cleanly. A file found
//! implicitly (priority 3) that fails to load is reported and skipped, so a
//! stale config never prevents startup.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "DOSSIER_CONFIG";

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument(PathBuf),
    Environment(PathBuf),
    ConfigFile(PathBuf),
    CompiledDefaults,
}

impl ConfigSource {
    /// Path of the file backing this source, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CliArgument(p)
            | ConfigSource::Environment(p)
            | ConfigSource::ConfigFile(p) => Some(p),
            ConfigSource::CompiledDefaults => None,
        }
    }
}

/// Resolves and loads a TOML configuration for one application
pub struct ConfigResolver {
    app_name: String,
    env_var_name: String,
}

impl ConfigResolver {
    /// Create a resolver for `app_name`, reading the path override from [`CONFIG_ENV_VAR`]
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            env_var_name: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Use a different environment variable for the path override
    pub fn with_env_var(mut self, env_var_name: &str) -> Self {
        self.env_var_name = env_var_name.to_string();
        self
    }

    /// Determine which configuration source applies
    pub fn resolve(&self, cli_arg: Option<&Path>) -> ConfigSource {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return ConfigSource::CliArgument(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = default_config_path(&self.app_name) {
            if path.exists() {
                return ConfigSource::ConfigFile(path);
            }
        }

        // Priority 4: Compiled defaults
        ConfigSource::CompiledDefaults
    }

    /// Resolve and load the configuration, returning it with its source
    pub fn load<T>(&self, cli_arg: Option<&Path>) -> Result<(T, ConfigSource)>
    where
        T: DeserializeOwned + Default,
    {
        let source = self.resolve(cli_arg);
        match &source {
            ConfigSource::CliArgument(path) | ConfigSource::Environment(path) => {
                let config = load_toml(path)?;
                info!("Loaded configuration from {}", path.display());
                Ok((config, source))
            }
            ConfigSource::ConfigFile(path) => match load_toml(path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    Ok((config, source))
                }
                Err(e) => {
                    warn!(
                        "Ignoring unreadable config file {}: {}; using compiled defaults",
                        path.display(),
                        e
                    );
                    Ok((T::default(), ConfigSource::CompiledDefaults))
                }
            },
            ConfigSource::CompiledDefaults => {
                info!("No configuration file found; using compiled defaults");
                Ok((T::default(), source))
            }
        }
    }
}

/// Platform config file location: `<config_dir>/<app_name>/config.toml`
pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(app_name).join("config.toml"))
}

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Logging section of a configuration file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "dossier_fusion=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file; stderr when absent
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}
