use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, info};
use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments of the honeypot agent.
///
/// Both arguments fall back to environment variables so container deployments can keep a
/// baked-in configuration file and only inject the controller location.
#[derive(Parser, Debug, Clone)]
#[command(name = "bytebrew")]
#[command(version)]
#[command(about = "An SSH credential-capture honeypot")]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(env = "CONFIG_FILE", default_value = "config.example.toml")]
    pub config_file: PathBuf,

    /// Controller ingestion endpoint, overrides `logging.controller_url`
    #[arg(long, env = "CONTROLLER_URL")]
    pub controller_url: Option<String>,
}

/// Application configuration, loaded once at startup and handed to the agent.
///
/// # Fields Overview
///
/// - `services.ssh`: the fake SSH service (bind address, port, host key, timeouts)
/// - `logging`: remote telemetry towards the controller (enable flag, URL, delivery pool)
///
/// Every field has a default, so a file only needs to state what it changes.
#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub services: Services,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reads the configuration file at `path`.
    ///
    /// Values are checked by [`Config::apply_args`] or [`Config::validate`], once the
    /// command-line overrides had a chance to replace them.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::TomlError(e.to_string()))
    }

    /// Applies command-line/environment overrides on top of the file values, then validates.
    pub fn apply_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(url) = &args.controller_url {
            info!("Controller URL overridden from command line/environment");
            self.logging.controller_url = Some(url.clone());
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ssh = &self.services.ssh;
        if ssh.port == 0 {
            return Err(ConfigError::NotInRange(
                "services.ssh.port must be between 1 and 65535".to_string(),
            ));
        }
        if ssh.channel_timeout_secs == 0 {
            return Err(ConfigError::NotInRange(
                "services.ssh.channel_timeout_secs must be positive".to_string(),
            ));
        }
        if ssh.max_auth_attempts == 0 {
            return Err(ConfigError::NotInRange(
                "services.ssh.max_auth_attempts must be positive".to_string(),
            ));
        }
        if let Some(id) = &ssh.server_id {
            if !id.starts_with("SSH-2.0-") || id.contains(['\r', '\n']) {
                return Err(ConfigError::NotInRange(format!(
                    "services.ssh.server_id must be a single `SSH-2.0-` line, got {:?}",
                    id
                )));
            }
        }

        let logging = &self.logging;
        if logging.delivery_timeout_secs == 0 {
            return Err(ConfigError::NotInRange(
                "logging.delivery_timeout_secs must be positive".to_string(),
            ));
        }
        if logging.workers == 0 || logging.queue_capacity == 0 {
            return Err(ConfigError::NotInRange(
                "logging.workers and logging.queue_capacity must be positive".to_string(),
            ));
        }
        self.controller_endpoint()?;

        Ok(())
    }

    /// The ingestion endpoint, when remote logging is enabled and a URL is configured.
    ///
    /// A URL without a path (`http://controller:5000`) is completed with `/api/logs`; a URL
    /// with a path is used as-is.
    pub fn controller_endpoint(&self) -> Result<Option<Url>, ConfigError> {
        if !self.logging.remote_logging {
            return Ok(None);
        }
        let raw = match self.logging.controller_url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };

        let mut url = Url::parse(raw).map_err(|e| ConfigError::BadUrl(format!("{}: {}", raw, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::BadUrl(format!(
                "{}: only http and https are supported",
                raw
            )));
        }
        if url.path().is_empty() || url.path() == "/" {
            url.set_path("/api/logs");
        }
        Ok(Some(url))
    }

    pub fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.services.ssh.channel_timeout_secs)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.logging.delivery_timeout_secs)
    }
}
