//! Configuration loading for trialmoa.
//! Reads trialmoa.toml from `--config`, the TRIALMOA_CONFIG env var, or the
//! current directory. A missing file means defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use trialmoa_common::ColumnMap;


pub const CONFIG_ENV: &str = "TRIALMOA_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "trialmoa.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub columns: ColumnMap,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_vocabulary_path")]
    pub vocabulary: PathBuf,
    /// Written after `classify` when set.
    pub summary: Option<PathBuf>,
}

fn default_vocabulary_path() -> PathBuf { PathBuf::from("config/vocabulary.yaml") }

impl Default for PathsConfig {
    fn default() -> Self {
        Self { vocabulary: default_vocabulary_path(), summary: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "trialmoa=info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_min_frequency")]
    pub min_frequency: usize,
}

fn default_min_frequency() -> usize { 2 }

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { min_frequency: default_min_frequency() }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Nothing at this path; built-in defaults apply.
    Defaults(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults(path) => write!(f, "defaults ({} not found)", path.display()),
        }
    }
}

impl Config {
    /// Load configuration. An explicit path must exist; the env var and
    /// current-directory fallbacks may be absent.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        Self::resolve(explicit).map(|(config, _)| config)
    }

    /// Like `load`, also reporting where the configuration came from.
    /// Runs before logging is set up, so callers log the source themselves.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<(Self, ConfigSource)> {
        Self::resolve_with(explicit, std::env::var(CONFIG_ENV).ok())
    }

    fn resolve_with(explicit: Option<&Path>, env_path: Option<String>) -> anyhow::Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, ConfigSource::File(path.to_path_buf())));
        }

        let path = PathBuf::from(env_path.unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string()));
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults(path)));
        }
        Ok((Self::from_file(&path)?, ConfigSource::File(path)))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
