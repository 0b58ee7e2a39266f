//! Route guard: gates rendering of protected paths behind a session check.
//!
//! STATE MACHINE
//! =============
//! Init (not mounted) -> Checking -> Allowed | Redirecting | Unavailable.
//! One check runs per navigation. A check overtaken by a newer navigation
//! settles as `Superseded` and never navigates or changes state. A check whose
//! session fetch was overtaken by some other session operation, while the
//! navigation is still current, decides from the session state it finds.
//!
//! Redirects use replace-style navigation so the protected page is not left
//! in history, and the same sign-in URL is not issued twice in a row.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::GateConfig;
use crate::error::AuthError;
use crate::navigate::{NavigationMode, Navigator};
use crate::redirect;
use crate::routes::{ProtectedRoutes, path_of};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Not mounted yet; nothing is rendered.
    Init,
    /// Deciding whether the current path may render.
    Checking,
    /// Children may render.
    Allowed,
    /// A sign-in navigation has taken over.
    Redirecting,
    /// The backend could not be reached; the session is intact and a retry is possible.
    Unavailable,
}

/// Outcome of a single [`RouteGuard::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Guard not mounted; render nothing.
    NotReady,
    /// Render the protected children.
    Render,
    /// Sent to this sign-in URL.
    Redirect(String),
    /// Session could not be verified; offer a retry with this message.
    Retry(String),
    /// A newer navigation owns the guard now.
    Superseded,
}

pub struct RouteGuard {
    session: Arc<SessionStore>,
    routes: ProtectedRoutes,
    signin_path: String,
    navigator: Arc<dyn Navigator>,
    mounted: AtomicBool,
    navigation: AtomicU64,
    state: Mutex<GuardState>,
    last_redirect: Mutex<Option<String>>,
}

impl RouteGuard {
    pub fn new(
        session: Arc<SessionStore>,
        routes: ProtectedRoutes,
        signin_path: impl Into<String>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            routes,
            signin_path: signin_path.into(),
            navigator,
            mounted: AtomicBool::new(false),
            navigation: AtomicU64::new(0),
            state: Mutex::new(GuardState::Init),
            last_redirect: Mutex::new(None),
        }
    }

    pub fn from_config(session: Arc<SessionStore>, config: &GateConfig, navigator: Arc<dyn Navigator>) -> Self {
        Self::new(session, config.protected.clone(), config.signin_path.clone(), navigator)
    }

    /// Mark the execution environment ready. Checks before this render nothing.
    pub fn mount(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn state(&self) -> GuardState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the guard for a navigation to `location` (path plus optional query).
    pub async fn check(&self, location: &str) -> GuardDecision {
        if !self.mounted.load(Ordering::SeqCst) {
            tracing::debug!(%location, "guard not mounted; rendering nothing");
            return GuardDecision::NotReady;
        }

        let navigation = self.navigation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(GuardState::Checking);

        if path_of(location) == self.signin_path || !self.routes.is_protected(location) {
            tracing::info!(%location, "path not protected; allowing");
            return self.allow(navigation);
        }

        if !self.session.is_authenticated() {
            tracing::info!(%location, "protected path without credential; redirecting");
            return self.redirect(navigation, location);
        }

        if self.session.user().is_some() {
            tracing::info!(%location, "session already loaded; allowing");
            return self.allow(navigation);
        }

        tracing::info!(%location, "credential present without user; verifying");
        match self.session.fetch_user().await {
            Ok(Some(_)) => self.allow(navigation),
            Ok(None) => {
                tracing::info!(%location, "credential vanished during check; redirecting");
                self.redirect(navigation, location)
            }
            Err(AuthError::Superseded) if self.is_current(navigation) => {
                tracing::debug!(%location, "session changed under this check; re-evaluating");
                self.settle(navigation, location)
            }
            Err(AuthError::Superseded) => {
                tracing::debug!(%location, "session check superseded");
                GuardDecision::Superseded
            }
            Err(e) if e.is_session_fatal() || !self.session.is_authenticated() => {
                tracing::info!(%location, error = %e, "session rejected; redirecting");
                self.redirect(navigation, location)
            }
            Err(e) => {
                tracing::warn!(%location, error = %e, "session check unavailable; offering retry");
                if !self.is_current(navigation) {
                    return GuardDecision::Superseded;
                }
                self.set_state(GuardState::Unavailable);
                GuardDecision::Retry(e.to_string())
            }
        }
    }

    /// Decide from current session state after another operation overtook
    /// this navigation's fetch.
    fn settle(&self, navigation: u64, location: &str) -> GuardDecision {
        if self.session.user().is_some() {
            return self.allow(navigation);
        }
        if !self.session.is_authenticated() {
            return self.redirect(navigation, location);
        }
        if !self.is_current(navigation) {
            return GuardDecision::Superseded;
        }
        self.set_state(GuardState::Unavailable);
        GuardDecision::Retry("session changed during check".to_owned())
    }

    fn allow(&self, navigation: u64) -> GuardDecision {
        if !self.is_current(navigation) {
            return GuardDecision::Superseded;
        }
        *self.last_redirect.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.set_state(GuardState::Allowed);
        GuardDecision::Render
    }

    fn redirect(&self, navigation: u64, location: &str) -> GuardDecision {
        if !self.is_current(navigation) {
            return GuardDecision::Superseded;
        }
        self.set_state(GuardState::Redirecting);

        let url = redirect::signin_url(&self.signin_path, location);
        {
            let mut last = self.last_redirect.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_deref() == Some(url.as_str()) {
                tracing::debug!(%url, "redirect already issued");
                return GuardDecision::Redirect(url);
            }
            *last = Some(url.clone());
        }
        self.navigator.navigate(&url, NavigationMode::Replace);
        GuardDecision::Redirect(url)
    }

    fn is_current(&self, navigation: u64) -> bool {
        self.navigation.load(Ordering::SeqCst) == navigation
    }

    fn set_state(&self, state: GuardState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
