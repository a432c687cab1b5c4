//! Shared configuration for cvpkit tools.
//!
//! TOML profiles, password resolution (flag, env, keyring, plaintext) and
//! translation to `cvpkit_core::ControllerConfig`. The [`cluster`] module
//! reads the controller cluster's YAML file.

pub mod cluster;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use cvpkit_core::{ControllerConfig, TaskPolicy, TlsVerification};

pub use cluster::{ClusterConfig, ClusterError, NodeRole, NodeView};

/// Keyring service name; entries are `<profile>/password`.
pub const KEYRING_SERVICE: &str = "cvpkit";

/// Environment variable consulted for the password.
pub const PASSWORD_ENV: &str = "CVPKIT_PASSWORD";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CVPKIT_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Overall deadline for task monitoring in seconds.
    #[serde(default = "default_task_timeout")]
    pub task_timeout: u64,

    /// Seconds between task status polls.
    #[serde(default = "default_task_interval")]
    pub task_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            task_timeout: default_task_timeout(),
            task_interval: default_task_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_task_timeout() -> u64 {
    300
}
fn default_task_interval() -> u64 {
    1
}

/// A named controller profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Controller host name or address.
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Use `https`.
    #[serde(default)]
    pub ssl: bool,

    pub username: Option<String>,

    /// Plaintext password; prefer the keyring.
    pub password: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid certificates. Defaults to true: controllers ship
    /// self-signed.
    pub insecure: Option<bool>,

    pub timeout: Option<u64>,
}

fn default_port() -> u16 {
    80
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            ssl: false,
            username: None,
            password: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }

    pub fn tls(&self) -> TlsVerification {
        match (self.insecure, &self.ca_cert) {
            (Some(false), Some(ca)) => TlsVerification::CustomCa(ca.clone()),
            (Some(false), None) => TlsVerification::SystemDefaults,
            _ => TlsVerification::DangerAcceptInvalid,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Config file location: `CVPKIT_CONFIG`, else the platform config dir.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("io", "cvpkit", "cvpkit").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("cvpkit");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load defaults, then `path`, then `CVPKIT_*` environment overrides.
///
/// Nested keys use a double underscore: `CVPKIT_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CVPKIT_").split("__").ignore(&["password", "config"]));
    Ok(figment.extract()?)
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password: `flag`, then `CVPKIT_PASSWORD`, then the system
/// keyring, then the profile's plaintext value.
///
/// Interactive prompting is left to the caller.
pub fn resolve_password(
    flag: Option<&str>,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(pw) = flag {
        return Ok(SecretString::from(pw.to_owned()));
    }

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            debug!(profile = profile_name, "password from keyring");
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(pw) = profile.and_then(|p| p.password.as_ref()) {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── ControllerConfig construction ───────────────────────────────────

/// Controller root URL for `host:port`.
pub fn controller_url(host: &str, port: u16, ssl: bool) -> Result<url::Url, ConfigError> {
    let scheme = if ssl { "https" } else { "http" };
    let raw = format!("{scheme}://{host}:{port}");
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "host".into(),
        reason: format!("invalid controller address: {raw}"),
    })
}

/// Build a `ControllerConfig` from a profile and an already resolved
/// password.
pub fn profile_to_controller_config(
    profile: &Profile,
    password: SecretString,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = controller_url(&profile.host, profile.port, profile.ssl)?;
    let username = profile
        .username
        .clone()
        .ok_or_else(|| ConfigError::Validation {
            field: "username".into(),
            reason: format!("profile for {} has no username", profile.host),
        })?;

    Ok(ControllerConfig {
        url,
        username,
        password,
        tls: profile.tls(),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        task_policy: TaskPolicy {
            interval: Duration::from_secs(defaults.task_interval),
            timeout: Duration::from_secs(defaults.task_timeout),
        },
    })
}
