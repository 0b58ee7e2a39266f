//! In-process fake auth backend and test navigator.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};
use session_gate::navigate::{NavigationMode, Navigator};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";

#[derive(Default)]
pub struct BackendState {
    pub access_tokens: HashSet<String>,
    pub refresh_tokens: HashSet<String>,
    pub issued: usize,
    pub me_calls: usize,
    pub logout_calls: usize,
    pub refresh_calls: usize,
    pub me_delay: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn me_calls(&self) -> usize {
        self.state.lock().unwrap().me_calls
    }

    pub fn logout_calls(&self) -> usize {
        self.state.lock().unwrap().logout_calls
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.lock().unwrap().refresh_calls
    }

    /// Invalidate every access token while keeping refresh tokens valid.
    pub fn expire_access_tokens(&self) {
        self.state.lock().unwrap().access_tokens.clear();
    }

    pub fn set_me_delay(&self, delay: Duration) {
        self.state.lock().unwrap().me_delay = Some(delay);
    }

    /// Serve on an ephemeral port and return the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/auth/logout", post(logout))
            .route("/auth/refresh", post(refresh))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

fn user_json() -> Value {
    json!({ "id": 7, "username": USERNAME, "email": "alice@example.com" })
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn issue(state: &mut BackendState) -> (String, String) {
    state.issued += 1;
    let access = format!("at-{}", state.issued);
    let refresh = format!("rt-{}", state.issued);
    state.access_tokens.insert(access.clone());
    state.refresh_tokens.insert(refresh.clone());
    (access, refresh)
}

async fn login(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["username"] != USERNAME || body["password"] != PASSWORD {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let (access, refresh) = issue(&mut backend.state.lock().unwrap());
    Ok(Json(json!({ "access_token": access, "refresh_token": refresh, "user": user_json() })))
}

async fn me(State(backend): State<FakeBackend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let delay = {
        let mut state = backend.state.lock().unwrap();
        state.me_calls += 1;
        state.me_delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let token = bearer(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    if !backend.state.lock().unwrap().access_tokens.contains(&token) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(user_json()))
}

async fn logout(State(backend): State<FakeBackend>, headers: HeaderMap) -> StatusCode {
    let mut state = backend.state.lock().unwrap();
    state.logout_calls += 1;
    match bearer(&headers) {
        Some(token) if state.access_tokens.remove(&token) => StatusCode::NO_CONTENT,
        _ => StatusCode::UNAUTHORIZED,
    }
}

async fn refresh(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let mut state = backend.state.lock().unwrap();
    state.refresh_calls += 1;
    let presented = body["refresh_token"].as_str().unwrap_or_default().to_owned();
    if !state.refresh_tokens.remove(&presented) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let (access, refresh) = issue(&mut state);
    Ok(Json(json!({ "access_token": access, "refresh_token": refresh })))
}

// =============================================================================
// Navigator
// =============================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<(String, NavigationMode)>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<(String, NavigationMode)> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str, mode: NavigationMode) {
        self.visits.lock().unwrap().push((target.to_owned(), mode));
    }
}
