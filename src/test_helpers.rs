//! Shared fakes for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::AuthApi;
use crate::config::SessionPolicy;
use crate::error::AuthError;
use crate::navigate::{NavigationMode, Navigator};
use crate::session::SessionStore;
use crate::storage::{self, MemoryStorage, TokenStorage};
use crate::types::{LoginRequest, LoginResponse, RefreshResponse, User};

pub fn alice() -> User {
    User { id: "u1".into(), username: "alice".into(), email: "alice@example.com".into() }
}

pub fn login_response() -> LoginResponse {
    LoginResponse { access_token: "at-1".into(), refresh_token: Some("rt-1".into()), user: alice() }
}

// =============================================================================
// MockAuthApi
// =============================================================================

/// Scripted backend. Each endpoint pops its next queued reply; an empty
/// queue falls back to a success (or `Unauthorized` for refresh).
#[derive(Default)]
pub struct MockAuthApi {
    pub me_replies: Mutex<VecDeque<Result<User, AuthError>>>,
    pub login_replies: Mutex<VecDeque<Result<LoginResponse, AuthError>>>,
    pub logout_replies: Mutex<VecDeque<Result<(), AuthError>>>,
    pub refresh_replies: Mutex<VecDeque<Result<RefreshResponse, AuthError>>>,
    pub me_delay: Mutex<Option<Duration>>,
    pub logout_delay: Mutex<Option<Duration>>,
    pub me_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub me_tokens: Mutex<Vec<String>>,
}

impl MockAuthApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_me(&self, reply: Result<User, AuthError>) {
        self.me_replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_login(&self, reply: Result<LoginResponse, AuthError>) {
        self.login_replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_logout(&self, reply: Result<(), AuthError>) {
        self.logout_replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_refresh(&self, reply: Result<RefreshResponse, AuthError>) {
        self.refresh_replies.lock().unwrap().push_back(reply);
    }

    pub fn delay_me(&self, delay: Duration) {
        *self.me_delay.lock().unwrap() = Some(delay);
    }

    pub fn delay_logout(&self, delay: Duration) {
        *self.logout_delay.lock().unwrap() = Some(delay);
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.login_replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Ok(login_response()))
    }

    async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.me_tokens.lock().unwrap().push(access_token.to_owned());
        let delay = *self.me_delay.lock().unwrap();
        let reply = self.me_replies.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.unwrap_or_else(|| Ok(alice()))
    }

    async fn logout(&self, _access_token: &str) -> Result<(), AuthError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.logout_delay.lock().unwrap();
        let reply = self.logout_replies.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.unwrap_or(Ok(()))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.refresh_replies.lock().unwrap().pop_front();
        reply.unwrap_or(Err(AuthError::Unauthorized))
    }
}

// =============================================================================
// RecordingNavigator
// =============================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    pub visits: Mutex<Vec<(String, NavigationMode)>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn visits(&self) -> Vec<(String, NavigationMode)> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str, mode: NavigationMode) {
        self.visits.lock().unwrap().push((target.to_owned(), mode));
    }
}

// =============================================================================
// Builders
// =============================================================================

pub struct Fixture {
    pub storage: Arc<MemoryStorage>,
    pub api: Arc<MockAuthApi>,
    pub session: Arc<SessionStore>,
}

pub fn fixture_with(policy: SessionPolicy, timeout: Duration) -> Fixture {
    let storage = Arc::new(MemoryStorage::new());
    let api = MockAuthApi::new();
    let session = Arc::new(SessionStore::new(storage.clone(), api.clone(), policy, timeout));
    Fixture { storage, api, session }
}

pub fn fixture() -> Fixture {
    fixture_with(SessionPolicy::default(), Duration::from_secs(5))
}

/// Persist a signed-in session without touching the in-memory user.
pub fn seed_tokens(storage: &dyn TokenStorage) {
    storage::persist_login(storage, &login_response()).unwrap();
}
