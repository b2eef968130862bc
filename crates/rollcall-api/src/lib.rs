//! JSON REST API for Rollcall.
//!
//! Exposes an axum [`Router`] over the attendance store and session
//! lifecycle. Auth, TLS, and transport concerns are the caller's
//! responsibility; actor attribution arrives via headers the identity
//! collaborator sets (see [`identity`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rollcall_api::api_router(state))
//! ```

pub mod changes;
pub mod demo;
pub mod error;
pub mod identity;
pub mod notifications;
pub mod records;
pub mod sessions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use rollcall_core::store::AttendanceStore;
use rollcall_verify::lifecycle::SessionLifecycle;

pub use error::ApiError;

/// Shared handler state. Cloning is cheap — both members are handles.
#[derive(Clone)]
pub struct AppState {
  pub store:     AttendanceStore,
  pub lifecycle: Arc<SessionLifecycle>,
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router(state: AppState) -> Router<()> {
  Router::new()
    // Records
    .route("/records", get(records::list).post(records::create))
    .route("/records/score", post(records::score))
    // Roster
    .route("/students", get(records::students))
    // Session
    .route(
      "/session",
      get(sessions::get_active)
        .post(sessions::start)
        .delete(sessions::end),
    )
    // Notifications
    .route(
      "/notifications",
      get(notifications::list).post(notifications::create),
    )
    .route("/notifications/{id}", axum::routing::delete(notifications::remove))
    // Change feed
    .route("/changes", get(changes::poll))
    // Demo data (display-only; never the authoritative log)
    .route("/demo/records", get(demo::list))
    .with_state(state)
}
