//! Backend auth endpoints.
//!
//! `AuthApi` is the seam the session store talks through; `HttpAuthApi` is
//! the thin `reqwest` wrapper used in production. Status classification and
//! body parsing are pure functions for testability.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::AuthError;
use crate::types::{LoginRequest, LoginResponse, RefreshResponse, User};

pub const LOGIN_PATH: &str = "/auth/login";
pub const CURRENT_USER_PATH: &str = "/auth/me";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Calls the session store makes against the backend.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError>;

    /// `GET /auth/me` with a bearer token.
    async fn current_user(&self, access_token: &str) -> Result<User, AuthError>;

    /// `POST /auth/logout` with a bearer token.
    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;

    /// `POST /auth/refresh` exchanging a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Build a client rooted at `base_url` (trailing `/` ignored).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, request_timeout: Duration, connect_timeout: Duration) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| AuthError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<String, AuthError> {
        let status = response.status();
        let text = response.text().await.map_err(map_send_error)?;
        check_status(status, text)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;
        parse_json(&Self::read(response).await?)
    }

    async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let response = self
            .http
            .get(self.url(CURRENT_USER_PATH))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_send_error)?;
        parse_json(&Self::read(response).await?)
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.url(LOGOUT_PATH))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(map_send_error)?;
        Self::read(response).await.map(|_| ())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(map_send_error)?;
        parse_json(&Self::read(response).await?)
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn map_send_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() { AuthError::Timeout } else { AuthError::Transport(e.to_string()) }
}

/// Map a response status to the auth error taxonomy, passing the body through on success.
fn check_status(status: StatusCode, body: String) -> Result<String, AuthError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AuthError::Unauthorized);
    }
    if !status.is_success() {
        return Err(AuthError::ApiResponse { status: status.as_u16(), body });
    }
    Ok(body)
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, AuthError> {
    serde_json::from_str(body).map_err(|e| AuthError::ApiParse(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
