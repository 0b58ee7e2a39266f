//! Sign-in flow: credential submission and the return trip to the redirect target.
//!
//! On success the tokens are persisted and a hard navigation goes to the
//! `redirect` query parameter if present, else `/`. The full reload makes every
//! guard and layout re-evaluate against the new session.

use std::sync::Arc;

use crate::error::AuthError;
use crate::navigate::{NavigationMode, Navigator};
use crate::redirect;
use crate::session::SessionStore;
use crate::types::LoginRequest;

const MISSING_FIELDS: &str = "Enter both username and password.";

#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    /// The form was incomplete; nothing was sent.
    #[error("{0}")]
    Validation(&'static str),

    /// The backend call or persisting the session failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl SignInError {
    /// Form-level error text shown under the sign-in form.
    #[must_use]
    pub fn form_message(&self) -> String {
        match self {
            Self::Validation(msg) => (*msg).to_owned(),
            Self::Auth(AuthError::Unauthorized) => "Invalid username or password.".to_owned(),
            Self::Auth(AuthError::Timeout) => "The server took too long to respond. Try again.".to_owned(),
            Self::Auth(AuthError::Transport(_)) => "Could not reach the server. Check your connection.".to_owned(),
            Self::Auth(e) => format!("Sign-in failed: {e}"),
        }
    }
}

/// Trim both fields and require them to be non-empty.
///
/// # Errors
///
/// Returns a validation message when either field is blank.
pub fn validate_credentials(username: &str, password: &str) -> Result<LoginRequest, SignInError> {
    let username = username.trim();
    if username.is_empty() || password.trim().is_empty() {
        return Err(SignInError::Validation(MISSING_FIELDS));
    }
    Ok(LoginRequest { username: username.to_owned(), password: password.to_owned() })
}

pub struct SignInFlow {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl SignInFlow {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }

    /// Submit the form. `query` is the sign-in view's query string.
    ///
    /// Returns the navigation target on success.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, or the backend failure.
    pub async fn submit(&self, username: &str, password: &str, query: &str) -> Result<String, SignInError> {
        let request = validate_credentials(username, password)?;
        let user = self.session.sign_in(&request).await?;

        let target = redirect::post_signin_target(query);
        tracing::info!(user_id = %user.id, %target, "sign-in complete; reloading");
        self.navigator.navigate(&target, NavigationMode::Hard);
        Ok(target)
    }
}

#[cfg(test)]
#[path = "signin_test.rs"]
mod tests;
