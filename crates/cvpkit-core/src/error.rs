// ── Core error types ──
//
// Errors raised by the snapshot, restore and reset engines. Controller API
// failures are wrapped unchanged so callers can still inspect the numeric
// error code; everything else is a domain condition detected here.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Controller errors ────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] cvpkit_api::Error),

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Version gate ─────────────────────────────────────────────────
    #[error("Controller version {found} does not match supported version {expected}")]
    VersionMismatch { found: String, expected: String },

    #[error("Snapshot format version {version} is not supported (supported: {supported})")]
    UnsupportedSnapshotVersion { version: String, supported: String },

    // ── Snapshot content ─────────────────────────────────────────────
    #[error("Invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    #[error("Configlet {name} has unknown type {configlet_type:?}")]
    UnknownConfigletType { name: String, configlet_type: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    // ── Tasks ────────────────────────────────────────────────────────
    #[error("Task {task_id} {status}")]
    TaskFailed { task_id: u64, status: String },

    #[error("Task {task_id} did not complete within {timeout_secs}s")]
    TaskTimeout { task_id: u64, timeout_secs: u64 },

    // ── Caller / environment errors ──────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn not_found(entity_type: &str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    pub(crate) fn invalid_snapshot(message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            message: message.into(),
        }
    }

    /// Controller error code, when this wraps an API error envelope.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Api(e) => e.error_code(),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth())
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_connection())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Version gate failures, bypassable with the skip-version-check override.
    pub fn is_version_gate(&self) -> bool {
        matches!(
            self,
            Self::VersionMismatch { .. } | Self::UnsupportedSnapshotVersion { .. }
        )
    }
}
