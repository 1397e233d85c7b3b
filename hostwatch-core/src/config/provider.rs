//! Configuration providers
//!
//! Two sources are supported: environment variables (the `SSH_SERVERS`
//! convention) and a TOML file. Both produce an ordered list of
//! [`TargetConfig`] values; the registry takes it from there.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

use super::settings::MonitorSettings;
use super::{AuthSecret, DEFAULT_SSH_PORT, TargetConfig, expand_key_path};

/// Supplies target configuration at startup
pub trait ConfigProvider: Send + Sync {
    /// Loads the ordered list of targets
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the source is unreadable or malformed.
    fn load_targets(&self) -> ConfigResult<Vec<TargetConfig>>;

    /// Loads monitoring settings; sources without settings use the defaults
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the source is unreadable or malformed.
    fn load_settings(&self) -> ConfigResult<MonitorSettings> {
        Ok(MonitorSettings::default())
    }

    /// Human-readable description of the source
    fn describe(&self) -> String;
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads targets from environment variables
///
/// ```text
/// SSH_SERVERS=production,staging
/// SSH_PRODUCTION_HOST=192.168.1.100
/// SSH_PRODUCTION_PORT=22
/// SSH_PRODUCTION_USER=admin
/// SSH_PRODUCTION_PASSWORD=secret     (or SSH_PRODUCTION_KEY=~/.ssh/id_ed25519)
/// SSH_PRODUCTION_PASSPHRASE=...
/// SSH_PRODUCTION_SERVICES=nginx,app
/// ```
///
/// Entries without a host or user are skipped with a warning.
pub struct EnvConfigProvider {
    lookup: EnvLookup,
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvConfigProvider {
    /// Creates a provider reading the process environment
    #[must_use]
    pub fn new() -> Self {
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Creates a provider over a fixed set of variables
    #[must_use]
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self {
            lookup: Box::new(move |key| vars.get(key).cloned()),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn load_one(&self, name: &str) -> ConfigResult<Option<TargetConfig>> {
        let prefix = format!("SSH_{}_", name.to_uppercase().replace('-', "_"));
        let key = |suffix: &str| format!("{prefix}{suffix}");

        let (Some(host), Some(username)) = (self.var(&key("HOST")), self.var(&key("USER"))) else {
            tracing::warn!(target_name = %name, "Incomplete configuration, skipping target");
            return Ok(None);
        };

        let port = match self.var(&key("PORT")) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                field: key("PORT"),
                reason: e.to_string(),
            })?,
            None => DEFAULT_SSH_PORT,
        };

        let auth = resolve_auth(
            self.var(&key("PASSWORD")),
            self.var(&key("KEY")).as_deref(),
            self.var(&key("PASSPHRASE")),
        );

        let watched_services = self
            .var(&key("SERVICES"))
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        Ok(Some(TargetConfig {
            name: name.to_string(),
            host,
            port,
            username,
            auth,
            watched_services,
        }))
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn load_targets(&self) -> ConfigResult<Vec<TargetConfig>> {
        let Some(names) = self.var("SSH_SERVERS") else {
            return Ok(Vec::new());
        };

        let mut targets = Vec::new();
        for name in split_list(&names) {
            if let Some(target) = self.load_one(&name)? {
                tracing::debug!(target_name = %target.name, host = %target.host, "Target loaded");
                targets.push(target);
            }
        }
        Ok(targets)
    }

    fn describe(&self) -> String {
        "environment (SSH_SERVERS)".to_string()
    }
}

/// On-disk layout of `hostwatch.toml`
#[derive(Debug, Default, Deserialize)]
pub struct HostwatchFile {
    /// Monitoring settings
    #[serde(default)]
    pub monitoring: MonitorSettings,
    /// Target entries in declaration order
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

/// One `[[targets]]` entry as written in the file
#[derive(Deserialize)]
pub struct TargetEntry {
    name: String,
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    username: String,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    key_path: Option<String>,
    #[serde(default)]
    passphrase: Option<String>,
    #[serde(default)]
    services: Vec<String>,
}

const fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl std::fmt::Debug for TargetEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetEntry")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("key_path", &self.key_path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .field("services", &self.services)
            .finish()
    }
}

impl From<TargetEntry> for TargetConfig {
    fn from(entry: TargetEntry) -> Self {
        let auth = resolve_auth(entry.password, entry.key_path.as_deref(), entry.passphrase);
        Self {
            name: entry.name,
            host: entry.host,
            port: entry.port,
            username: entry.username,
            auth,
            watched_services: entry.services,
        }
    }
}

/// Reads targets and settings from a TOML file
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    /// Creates a provider for the given file
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `$XDG_CONFIG_HOME/hostwatch/hostwatch.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hostwatch").join("hostwatch.toml"))
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the whole file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn read(&self) -> ConfigResult<HostwatchFile> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|reason| ConfigError::Parse {
            path: self.path.clone(),
            reason,
        })
    }

    /// Parses file content
    ///
    /// # Errors
    ///
    /// Returns the TOML parser message on failure.
    pub fn parse(content: &str) -> Result<HostwatchFile, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load_targets(&self) -> ConfigResult<Vec<TargetConfig>> {
        Ok(self
            .read()?
            .targets
            .into_iter()
            .map(TargetConfig::from)
            .collect())
    }

    fn load_settings(&self) -> ConfigResult<MonitorSettings> {
        Ok(self.read()?.monitoring)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn resolve_auth(
    password: Option<String>,
    key_path: Option<&str>,
    passphrase: Option<String>,
) -> Option<AuthSecret> {
    match (key_path, password) {
        (Some(key), _) => Some(AuthSecret::PrivateKey {
            key_path: expand_key_path(key),
            passphrase: passphrase.map(SecretString::from),
        }),
        (None, Some(password)) => Some(AuthSecret::Password(SecretString::from(password))),
        (None, None) => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
