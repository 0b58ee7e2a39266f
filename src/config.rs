//! Gate configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::routes::ProtectedRoutes;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SIGNIN_PATH: &str = "/routes/auth/signin";
pub const DEFAULT_STORAGE_PATH: &str = ".session-gate.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl GateTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for GateTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// How the session store reacts to a failed "current user" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Try one refresh-token exchange before giving up on a 401.
    pub refresh_on_unauthorized: bool,
    /// Treat transport failures and timeouts like a rejected credential.
    pub logout_on_transport_error: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self { refresh_on_unauthorized: true, logout_on_transport_error: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub api_base_url: String,
    pub signin_path: String,
    pub protected: ProtectedRoutes,
    pub storage_path: PathBuf,
    pub timeouts: GateTimeouts,
    pub policy: SessionPolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            signin_path: DEFAULT_SIGNIN_PATH.to_owned(),
            protected: ProtectedRoutes::default(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            timeouts: GateTimeouts::default(),
            policy: SessionPolicy::default(),
        }
    }
}

impl GateConfig {
    /// Build typed gate config from environment variables.
    ///
    /// Optional:
    /// - `GATE_API_BASE_URL`: backend base URL
    /// - `GATE_SIGNIN_PATH`: sign-in view path, default `/routes/auth/signin`
    /// - `GATE_PROTECTED_PATHS`: comma-separated patterns (`/a`, `/b/*`)
    /// - `GATE_STORAGE_PATH`: persisted storage file
    /// - `GATE_REQUEST_TIMEOUT_SECS`: default 10
    /// - `GATE_CONNECT_TIMEOUT_SECS`: default 5
    /// - `GATE_REFRESH_ON_UNAUTHORIZED`: default true
    /// - `GATE_LOGOUT_ON_TRANSPORT_ERROR`: default false
    ///
    /// # Errors
    ///
    /// Returns an error if the sign-in path or a protected pattern is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = env_string("GATE_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let signin_path = env_string("GATE_SIGNIN_PATH").unwrap_or_else(|| DEFAULT_SIGNIN_PATH.to_owned());
        if !signin_path.starts_with('/') {
            return Err(ConfigError::Parse(format!("GATE_SIGNIN_PATH must start with '/': {signin_path}")));
        }

        let protected = match env_string("GATE_PROTECTED_PATHS") {
            Some(raw) => ProtectedRoutes::parse_list(&raw)?,
            None => ProtectedRoutes::default(),
        };

        let storage_path =
            PathBuf::from(env_string("GATE_STORAGE_PATH").unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_owned()));

        let timeouts = GateTimeouts {
            request_secs: env_parse_u64("GATE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("GATE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let defaults = SessionPolicy::default();
        let policy = SessionPolicy {
            refresh_on_unauthorized: env_bool("GATE_REFRESH_ON_UNAUTHORIZED")
                .unwrap_or(defaults.refresh_on_unauthorized),
            logout_on_transport_error: env_bool("GATE_LOGOUT_ON_TRANSPORT_ERROR")
                .unwrap_or(defaults.logout_on_transport_error),
        };

        Ok(Self { api_base_url, signin_path, protected, storage_path, timeouts, policy })
    }
}

fn env_string(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_owned()),
        _ => None,
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    match env_string(key).map(|v| v.parse::<u64>()) {
        Some(Ok(value)) if value > 0 => value,
        _ => default,
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_string(key).and_then(|raw| parse_bool(&raw))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
