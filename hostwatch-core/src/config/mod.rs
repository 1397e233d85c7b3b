//! Target configuration for `Hostwatch`
//!
//! Targets are loaded once at startup from a [`ConfigProvider`] and frozen in
//! a [`TargetRegistry`]. Nothing in this module is mutated after loading.

mod provider;
pub mod registry;
mod settings;

use std::path::PathBuf;

use secrecy::SecretString;

pub use provider::{
    ConfigProvider, EnvConfigProvider, FileConfigProvider, HostwatchFile, TargetEntry,
};
pub use registry::TargetRegistry;
pub use settings::{MonitorSettings, clamp_minutes};

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Authentication secret for a target
///
/// A private key takes precedence over a password when both are configured.
#[derive(Debug, Clone)]
pub enum AuthSecret {
    /// Password authentication
    Password(SecretString),
    /// Public key authentication
    PrivateKey {
        /// Path to the private key file (already tilde-expanded)
        key_path: PathBuf,
        /// Optional passphrase protecting the key
        passphrase: Option<SecretString>,
    },
}

impl AuthSecret {
    /// Short name of the method, safe for logs
    #[must_use]
    pub const fn method_name(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::PrivateKey { .. } => "publickey",
        }
    }
}

/// Immutable configuration of one remote host
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Unique name used to address the target
    pub name: String,
    /// Hostname or IP address
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Remote login user
    pub username: String,
    /// Authentication secret, if any was configured
    pub auth: Option<AuthSecret>,
    /// systemd units whose state is reported on every tick
    pub watched_services: Vec<String>,
}

impl TargetConfig {
    /// Creates a target with no authentication and no watched services
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            auth: None,
            watched_services: Vec::new(),
        }
    }

    /// Sets the SSH port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Uses password authentication
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthSecret::Password(SecretString::from(password.into())));
        self
    }

    /// Uses public key authentication
    #[must_use]
    pub fn with_private_key(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: Option<String>,
    ) -> Self {
        self.auth = Some(AuthSecret::PrivateKey {
            key_path: key_path.into(),
            passphrase: passphrase.map(SecretString::from),
        });
        self
    }

    /// Sets the watched services
    #[must_use]
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watched_services = services.into_iter().map(Into::into).collect();
        self
    }

    /// `user@host` destination string
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// Expands a leading `~` in a key path
pub(crate) fn expand_key_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
