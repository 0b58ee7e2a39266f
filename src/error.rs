//! Error types for the session gate.
//!
//! DESIGN
//! ======
//! Backend failures are split by cause so callers can tell an invalid session
//! (`Unauthorized`) from a backend that is merely unreachable
//! (`Transport`/`Timeout`). Only the former destroys the local session.

/// Stable machine-readable code plus retry hint for an error.
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Errors from the persisted key/value storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized for storage.
    #[error("storage serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backing file exists but does not hold a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(String),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORAGE_IO",
            Self::Serialize(_) => "E_STORAGE_SERIALIZE",
            Self::Corrupt(_) => "E_STORAGE_CORRUPT",
        }
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Errors from backend auth calls and session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The backend rejected the credential (HTTP 401/403).
    #[error("unauthorized")]
    Unauthorized,

    /// The request never produced a response (DNS, connect, reset).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend returned a non-success status other than 401/403.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A newer session operation started while this one was in flight.
    #[error("superseded by a newer session operation")]
    Superseded,

    /// Persisting or clearing credentials failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Whether this failure means the credential itself is no longer valid.
    #[must_use]
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Whether this failure came from the network rather than the backend's verdict.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Timeout => "E_TIMEOUT",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Superseded => "E_SUPERSEDED",
            Self::Storage(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Errors produced while reading [`crate::config::GateConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// A protected path pattern is malformed.
    #[error("invalid path pattern '{0}': patterns must start with '/'")]
    InvalidPattern(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
            Self::InvalidPattern(_) => "E_CONFIG_PATTERN",
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
