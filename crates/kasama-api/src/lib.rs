//! JSON REST API for the Kasama family registry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`kasama_core::store::RegistryStore`]. Session auth, TLS, and transport
//! concerns are the caller's responsibility — the portal mounts this
//! behind its own login layer.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kasama_api::api_router(state.clone()))
//! ```

pub mod accounts;
pub mod check;
pub mod error;
pub mod registrations;
pub mod review;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use kasama_core::{notify::Notifier, store::RegistryStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub notifier: Arc<dyn Notifier>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: RegistryStore + 'static,
{
  Router::new()
    // Accounts
    .route("/accounts", post(accounts::create::<S>))
    .route("/accounts/{id}/members", get(accounts::members::<S>))
    // Registration queue
    .route(
      "/registrations",
      get(registrations::list::<S>).post(registrations::submit::<S>),
    )
    .route("/registrations/{id}", delete(registrations::withdraw::<S>))
    // Approval state machine
    .route("/registrations/{id}/approve", post(review::approve::<S>))
    .route("/registrations/{id}/reject", post(review::reject::<S>))
    // Live-typing advisory check
    .route("/duplicate-check", get(check::handler::<S>))
    .with_state(state)
}
