use thiserror::Error;

use crate::codes;

/// Top-level error type for the `cvpkit-api` crate.
///
/// Every controller-side failure is reported as [`Error::Api`] carrying the
/// numeric `errorCode` the controller returned. Callers that need to branch
/// on a specific condition use [`Error::is_conflict`] or
/// [`Error::is_not_found`] rather than matching raw numbers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed or the session was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status without a controller error envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Controller ──────────────────────────────────────────────────
    /// Error envelope returned by the controller: `{"errorCode", "errorMessage"}`.
    #[error("{code}: {message}")]
    Api { code: i64, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Local file access while uploading or downloading images.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::Api`], filling in the default message for known
    /// codes when the controller sent none.
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            codes::describe(code)
        } else {
            message
        };
        Self::Api { code, message }
    }

    /// The controller error code, if this is a controller-side error.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` for the "already exists" family of codes.
    pub fn is_conflict(&self) -> bool {
        self.error_code().is_some_and(codes::is_conflict)
    }

    /// Returns `true` if the referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { code, .. } => codes::is_not_found(*code),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the error came from authentication or session state.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
            || self.error_code() == Some(codes::USER_UNAUTHORISED)
    }

    /// Returns `true` if the controller could not be reached.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}
