//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text
//! and a fixed process exit code per category.

use miette::Diagnostic;
use thiserror::Error;

use cvpkit_config::{ClusterError, ConfigError};
use cvpkit_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const TASK_FAILED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(cvptool::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Try --ssl true --port 443 if the web server only listens on HTTPS."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for {user}")]
    #[diagnostic(
        code(cvptool::auth_failed),
        help("Verify the username and password, or the keyring entry cvpkit/<profile>/password.")
    )]
    AuthFailed { user: String },

    #[error("No password available for profile '{profile}'")]
    #[diagnostic(
        code(cvptool::no_credentials),
        help("Pass --password, set CVPKIT_PASSWORD, or run interactively to be prompted.")
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(cvptool::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Versions ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(cvptool::version_mismatch),
        help("Use --skipVersionCheck to proceed anyway.")
    )]
    VersionGate { message: String },

    // ── Controller ───────────────────────────────────────────────────
    #[error("Controller error {code}: {message}")]
    #[diagnostic(code(cvptool::api_error))]
    ApiError { code: i64, message: String },

    #[error("Controller conflict {code}: {message}")]
    #[diagnostic(code(cvptool::conflict))]
    Conflict { code: i64, message: String },

    // ── Tasks ────────────────────────────────────────────────────────
    #[error("Task {task_id} {status}")]
    #[diagnostic(
        code(cvptool::task_failed),
        help("Inspect the task on the controller; objects restored before it remain in place.")
    )]
    TaskFailed { task_id: u64, status: String },

    #[error("Task {task_id} did not finish within {seconds}s")]
    #[diagnostic(
        code(cvptool::timeout),
        help("Raise defaults.task_timeout in the config file.")
    )]
    Timeout { task_id: u64, seconds: u64 },

    // ── Other failures ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(cvptool::failed))]
    Operation { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cvptool::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cvptool::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller host given")]
    #[diagnostic(
        code(cvptool::no_host),
        help(
            "Pass --host, --cluster-config, or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoHost { path: String },

    #[error(transparent)]
    #[diagnostic(code(cvptool::config))]
    Config(ConfigError),

    #[error(transparent)]
    #[diagnostic(code(cvptool::cluster))]
    Cluster(#[from] ClusterError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(cvptool::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Aborted")]
    Aborted,

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::VersionGate { .. } | Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::TaskFailed { .. } => exit_code::TASK_FAILED,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoHost { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn usage(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_version_gate() {
            return Self::VersionGate {
                message: err.to_string(),
            };
        }

        match err {
            CoreError::Api(api) => from_api(api),

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },

            CoreError::TaskFailed { task_id, status } => CliError::TaskFailed { task_id, status },

            CoreError::TaskTimeout {
                task_id,
                timeout_secs,
            } => CliError::Timeout {
                task_id,
                seconds: timeout_secs,
            },

            CoreError::Validation { message } => CliError::Validation {
                field: "arguments".into(),
                reason: message,
            },

            CoreError::Io(e) => CliError::Io(e),

            other => CliError::Operation {
                message: other.to_string(),
            },
        }
    }
}

fn from_api(api: cvpkit_api::Error) -> CliError {
    if api.is_auth() {
        return CliError::AuthFailed {
            user: "current user".into(),
        };
    }
    if api.is_connection() || matches!(api, cvpkit_api::Error::Tls(_)) {
        let url = match &api {
            cvpkit_api::Error::Transport(e) => e.url().map(ToString::to_string),
            _ => None,
        };
        return CliError::ConnectionFailed {
            url: url.unwrap_or_else(|| "(unknown)".into()),
            source: Box::new(api),
        };
    }
    match api {
        cvpkit_api::Error::Api { code, message } if cvpkit_api::codes::is_conflict(code) => {
            CliError::Conflict { code, message }
        }
        cvpkit_api::Error::Api { code, message } => CliError::ApiError { code, message },
        other => CliError::Operation {
            message: other.to_string(),
        },
    }
}
