//! Session store: the single source of truth for "who is signed in".
//!
//! DESIGN
//! ======
//! The store is built explicitly and shared by `Arc`; there is no global.
//! Persisted credentials live in a [`TokenStorage`]; the in-memory user is a
//! projection of them that can be lost and reloaded.
//!
//! CONCURRENCY
//! ===========
//! Every state-changing operation takes a new generation from an atomic
//! counter. A backend response is applied only if its generation is still the
//! latest; otherwise it is reported as [`AuthError::Superseded`] and dropped.
//! Taking a generation together with the token it will use, applying a
//! response, and clearing for logout all happen under the user mutex.
//! The user mutex is never held across an `.await`.
//!
//! FAILURE SEMANTICS
//! =================
//! Only `Unauthorized` destroys the session, after one refresh-token exchange
//! when enabled. Transport failures and timeouts leave it intact so the caller
//! can offer a retry, unless `logout_on_transport_error` restores the older
//! "any failure logs out" behavior.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::api::AuthApi;
use crate::config::SessionPolicy;
use crate::error::{AuthError, StorageError};
use crate::storage::{self, TokenStorage};
use crate::types::{LoginRequest, User};

pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    api: Arc<dyn AuthApi>,
    policy: SessionPolicy,
    request_timeout: Duration,
    user: Mutex<Option<User>>,
    generation: AtomicU64,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn TokenStorage>,
        api: Arc<dyn AuthApi>,
        policy: SessionPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self { storage, api, policy, request_timeout, user: Mutex::new(None), generation: AtomicU64::new(0) }
    }

    /// True iff a non-empty access token is persisted. No expiry or signature check.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        match storage::access_token(self.storage.as_ref()) {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "token storage unreadable; treating as signed out");
                false
            }
        }
    }

    /// The in-memory user, if loaded.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.user_slot().clone()
    }

    /// Replace the in-memory user. Does not touch persisted storage.
    pub fn set_user(&self, user: User) {
        self.begin();
        *self.user_slot() = Some(user);
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Load the persisted user into memory at process start.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    pub fn bootstrap(&self) -> Result<Option<User>, StorageError> {
        let user = match storage::access_token(self.storage.as_ref())? {
            Some(_) => storage::load_user(self.storage.as_ref())?,
            None => None,
        };
        tracing::debug!(restored = user.is_some(), "session bootstrap");
        *self.user_slot() = user.clone();
        Ok(user)
    }

    /// Refresh the in-memory user from `GET /auth/me`.
    ///
    /// Returns `Ok(None)` without any network call when no token is persisted.
    ///
    /// # Errors
    ///
    /// `Unauthorized` after the session has been cleared, `Transport`/`Timeout`
    /// with the session left intact (unless configured otherwise), and
    /// `Superseded` when a newer operation overtook this one.
    pub async fn fetch_user(&self) -> Result<Option<User>, AuthError> {
        let (generation, token) = {
            let mut slot = self.user_slot();
            let generation = self.begin();
            let Some(token) = storage::access_token(self.storage.as_ref())? else {
                tracing::debug!("no access token; clearing user");
                *slot = None;
                return Ok(None);
            };
            (generation, token)
        };

        let result = match self.call(self.api.current_user(&token)).await {
            Err(AuthError::Unauthorized) if self.policy.refresh_on_unauthorized => {
                self.refresh_and_retry(generation).await
            }
            other => other,
        };

        if !self.is_current(generation) {
            tracing::debug!(generation, "discarding stale current-user response");
            return Err(AuthError::Superseded);
        }

        match result {
            Ok(user) => {
                let mut slot = self.user_slot();
                if !self.is_current(generation) {
                    return Err(AuthError::Superseded);
                }
                storage::store_user(self.storage.as_ref(), &user)?;
                *slot = Some(user.clone());
                drop(slot);
                tracing::info!(user_id = %user.id, "current user loaded");
                Ok(Some(user))
            }
            Err(AuthError::Superseded) => Err(AuthError::Superseded),
            Err(e) if e.is_session_fatal() || self.policy.logout_on_transport_error => {
                tracing::warn!(error = %e, "current-user check failed; logging out");
                self.logout().await?;
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_transport(), "current-user check failed; keeping session");
                Err(e)
            }
        }
    }

    /// Clear local state unconditionally, then tell the backend (best effort).
    ///
    /// Local state is gone before the backend call is awaited, so a
    /// `fetch_user` started meanwhile finds no token.
    ///
    /// # Errors
    ///
    /// Returns an error only if the persisted credentials cannot be removed.
    pub async fn logout(&self) -> Result<(), StorageError> {
        let token = {
            let mut slot = self.user_slot();
            self.begin();
            *slot = None;
            let token = match storage::access_token(self.storage.as_ref()) {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(error = %e, "token storage unreadable during logout");
                    None
                }
            };
            storage::clear_session(self.storage.as_ref())?;
            token
        };
        tracing::info!("session cleared");

        if let Some(token) = token {
            if let Err(e) = self.call(self.api.logout(&token)).await {
                tracing::warn!(error = %e, "backend logout failed; local session already cleared");
            }
        }
        Ok(())
    }

    /// Exchange credentials for tokens and persist them with the user.
    ///
    /// # Errors
    ///
    /// Returns the backend error (`Unauthorized` for bad credentials) or a
    /// storage error; nothing is persisted on failure.
    pub async fn sign_in(&self, request: &LoginRequest) -> Result<User, AuthError> {
        let generation = self.begin();
        let login = self.call(self.api.login(request)).await?;
        let mut slot = self.user_slot();
        if !self.is_current(generation) {
            return Err(AuthError::Superseded);
        }
        storage::persist_login(self.storage.as_ref(), &login)?;
        *slot = Some(login.user.clone());
        drop(slot);
        tracing::info!(user_id = %login.user.id, "signed in");
        Ok(login.user)
    }

    async fn refresh_and_retry(&self, generation: u64) -> Result<User, AuthError> {
        let Some(refresh_token) = storage::refresh_token(self.storage.as_ref())? else {
            return Err(AuthError::Unauthorized);
        };
        tracing::info!("access token rejected; attempting refresh");
        let refreshed = self.call(self.api.refresh(&refresh_token)).await?;
        {
            let _slot = self.user_slot();
            if !self.is_current(generation) {
                return Err(AuthError::Superseded);
            }
            self.storage.set(storage::ACCESS_TOKEN_KEY, &refreshed.access_token)?;
            if let Some(rotated) = &refreshed.refresh_token {
                self.storage.set(storage::REFRESH_TOKEN_KEY, rotated)?;
            }
        }
        self.call(self.api.current_user(&refreshed.access_token)).await
    }

    async fn call<T>(&self, fut: impl Future<Output = Result<T, AuthError>>) -> Result<T, AuthError> {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::Timeout),
        }
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn user_slot(&self) -> std::sync::MutexGuard<'_, Option<User>> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
