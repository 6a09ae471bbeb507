//! Reading relayer configuration from disk and the environment

use crate::{AppConfig, ConfigError, Result};
use config::{Config, Environment};
use std::path::Path;

/// On-disk formats the relayer accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Loads [`AppConfig`] values from files, strings, and the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read a relayer config from disk. The format is inferred from the
    /// file extension.
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ConfigFormat::from_extension)
            .ok_or_else(|| {
                ConfigError::LoadError(format!(
                    "cannot tell the config format of {} from its extension",
                    path.display()
                ))
            })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse a relayer config from a string in the given format.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<AppConfig> {
        let config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Build a config purely from environment variables named
    /// `PREFIX_SECTION_KEY`, e.g. `MEDIAN_RELAY_RELAYER_INTERVAL_SECS=30`.
    pub fn from_env(prefix: &str) -> Result<AppConfig> {
        let config = Config::builder()
            .add_source(Environment::with_prefix(prefix).separator("_"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Read a config file, then lay environment overrides on top of it.
    /// Missing or unparsable environment state leaves the file config as is.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        let base = Self::from_file(path)?;

        match Self::from_env(env_prefix) {
            Ok(overrides) => Ok(Self::merge(base, overrides)),
            Err(_) => Ok(base),
        }
    }

    /// Merge two configurations, with overlay taking precedence for scalar
    /// sections and list sections combined by union
    pub fn merge(base: AppConfig, overlay: AppConfig) -> AppConfig {
        AppConfig {
            ethereum: overlay.ethereum,
            p2p: overlay.p2p,
            rpc: overlay.rpc,
            relayer: overlay.relayer,
            feeds: if overlay.feeds.is_empty() {
                base.feeds
            } else {
                overlay.feeds
            },
            pairs: if overlay.pairs.is_empty() {
                base.pairs
            } else {
                overlay.pairs
            },
        }
    }
}
