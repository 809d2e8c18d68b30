use crate::utils::errors::{OutputError, Result};
use riemann_client::{Protocol, DEFAULT_PORT};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables overriding the config file
pub const ENV_PREFIX: &str = "RIEMANN_OUTPUT";

const DEFAULT_CONFIG_PATH: &str = "/etc/riemann-output/config.toml";

/// `riemann_event` keys that cannot be templated
const RESERVED_EVENT_KEYS: [&str; 2] = ["time", "tags"];

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// `tcp` or `udp`
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Copy all (flattened) event fields into the Riemann event
    pub map_fields: bool,
    /// Template for the Riemann `host`
    pub sender: String,
    /// Templated Riemann fields, e.g. `service = "%{program}"`
    pub riemann_event: BTreeMap<String, String>,
    pub timeout_secs: u64,
    /// Log every built event at info level
    pub debug: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Tcp.to_string(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            map_fields: false,
            sender: crate::services::event_builder::DEFAULT_SENDER.to_string(),
            riemann_event: BTreeMap::new(),
            timeout_secs: 5,
            debug: false,
        }
    }
}

impl OutputConfig {
    /// Load from the file named by `RIEMANN_OUTPUT_CONFIG` (or the default path)
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load from `path` if it exists, then apply `RIEMANN_OUTPUT_*` overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
        }

        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        Self::from_builder(builder)
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::builder::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| OutputError::Configuration(format!("Failed to load config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check option values that cannot be expressed in the type
    pub fn validate(&self) -> Result<()> {
        self.protocol()?;

        if self.timeout_secs == 0 {
            return Err(OutputError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        if let Some(key) = self
            .riemann_event
            .keys()
            .find(|key| RESERVED_EVENT_KEYS.contains(&key.as_str()))
        {
            return Err(OutputError::Configuration(format!(
                "riemann_event cannot set '{}'",
                key
            )));
        }

        Ok(())
    }

    pub fn protocol(&self) -> Result<Protocol> {
        self.protocol
            .parse()
            .map_err(|e: riemann_client::ClientError| OutputError::Configuration(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_config_path() -> PathBuf {
    std::env::var(format!("{}_CONFIG", ENV_PREFIX))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
