//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use resizer_cloud::Ec2Settings;
use resizer_core::WorkflowConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "RESIZER_CONFIG";

/// Environment variable overriding the message bus address
pub const NATS_URI_ENV: &str = "NATS_URI";

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No config file was found
    Defaults,
}

/// Top-level configuration for the resizer daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Process settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Message bus connection
    #[serde(default)]
    pub nats: NatsConfig,
    /// Cloud provider tuning
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Request validation, steps and reporting
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level (trace, debug, info, warn, error), `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Message bus connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Server address
    #[serde(default = "default_nats_uri")]
    pub uri: String,
    /// Share the inbound subject with other workers in this queue group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_group: Option<String>,
    /// Client name reported to the server
    #[serde(default = "default_connection_name")]
    pub connection_name: String,
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            uri: default_nats_uri(),
            queue_group: None,
            connection_name: default_connection_name(),
            connection_timeout_secs: default_connection_timeout_secs(),
        }
    }
}

/// Cloud provider tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Upper bound in seconds for each blocking wait
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
    /// Override the EC2 endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait_secs(),
            endpoint_url: None,
        }
    }
}

impl ProviderConfig {
    /// Settings handed to every EC2 provider
    #[must_use]
    pub fn ec2_settings(&self) -> Ec2Settings {
        Ec2Settings {
            max_wait: Duration::from_secs(self.max_wait_secs),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nats_uri() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_connection_name() -> String {
    "instance-resizer".to_string()
}

fn default_connection_timeout_secs() -> u64 {
    10
}

fn default_max_wait_secs() -> u64 {
    600
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Load from an explicit path, the default paths, or use defaults
    ///
    /// `NATS_URI` overrides whatever the file says. Nothing is logged here;
    /// the caller reports the returned source.
    ///
    /// # Errors
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<(Self, ConfigSource)> {
        let (mut config, source) = Self::locate(explicit)?;
        config.apply_nats_uri(std::env::var(NATS_URI_ENV).ok());
        Ok((config, source))
    }

    fn locate(explicit: Option<&Path>) -> eyre::Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            return Self::load_from(path.to_path_buf());
        }

        // Check environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(PathBuf::from(path));
        }

        // Try common paths
        let mut paths = vec![
            PathBuf::from("resizer.toml"),
            PathBuf::from("/etc/resizer/resizer.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("resizer/resizer.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok((Config::default(), ConfigSource::Defaults))
    }

    fn load_from(path: PathBuf) -> eyre::Result<(Self, ConfigSource)> {
        let config = Self::load(&path)?;
        Ok((config, ConfigSource::File(path)))
    }

    /// Replace the bus address when a non-empty override is given
    pub fn apply_nats_uri(&mut self, uri: Option<String>) {
        if let Some(uri) = uri.filter(|u| !u.trim().is_empty()) {
            self.nats.uri = uri;
        }
    }

    /// Render the effective configuration
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_toml(&self) -> eyre::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
