//! Client-side session gate for the marketplace frontend.
//!
//! ARCHITECTURE
//! ============
//! A [`session::SessionStore`] owns the persisted credentials and the
//! in-memory user. A [`guard::RouteGuard`] consults it on every navigation and
//! redirects unauthenticated visitors of protected paths to the sign-in view.
//! The [`signin::SignInFlow`] closes the loop by sending the user back to the
//! path they originally asked for.
//!
//! Every collaborator (storage, backend API, navigation) sits behind a trait
//! so the store is constructed explicitly and injected, never ambient.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod navigate;
pub mod redirect;
pub mod routes;
pub mod session;
pub mod signin;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
