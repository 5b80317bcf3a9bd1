//! Configuration loader for YAML files and environment resolution

use crate::config::types::*;
use crate::errors::StargazeError;
use std::env;
use std::path::Path;
use tokio::fs;

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from an optional YAML file.
    ///
    /// A missing path yields the defaults; environment overrides and
    /// validation are applied either way.
    pub async fn load(path: Option<&Path>) -> Result<StargazeConfig, StargazeError> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => Self::from_str("{}").await,
        }
    }

    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<StargazeConfig, StargazeError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            StargazeError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content).await
    }

    /// Load configuration from a YAML string
    pub async fn from_str(content: &str) -> Result<StargazeConfig, StargazeError> {
        let mut config: StargazeConfig = serde_yaml::from_str(content).map_err(|e| {
            StargazeError::ConfigError(format!("Failed to parse YAML config: {}", e))
        })?;

        Self::resolve_environment(&mut config)?;

        config.validate()?;

        Ok(config)
    }

    /// Resolve environment variables in the configuration
    fn resolve_environment(config: &mut StargazeConfig) -> Result<(), StargazeError> {
        for env_file in &config.environment.env_files {
            if env_file.exists() {
                log::debug!("Loading environment file {}", env_file.display());
                Self::load_env_file(env_file)?;
            }
        }

        config.apply_env_overrides_from(|key| env::var(key).ok())
    }

    /// Load environment variables from a `.env`-style file.
    ///
    /// Variables already present in the process environment win.
    pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<(), StargazeError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            StargazeError::ConfigError(format!(
                "Failed to read env file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        for (key, value) in parse_env_file(&content) {
            if env::var_os(&key).is_none() {
                env::set_var(key, value);
            }
        }

        Ok(())
    }
}

/// Parse `KEY=value` lines, skipping blanks and `#` comments.
pub fn parse_env_file(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
