//! JSON REST API for troth.
//!
//! Exposes an axum [`Router`] backed by any store implementing the core
//! traits. Auth, TLS, and transport concerns are the caller's
//! responsibility: the gateway in front of this service is trusted to
//! supply the acting `user_id`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", troth_api::api_router(state))
//! ```

pub mod admin;
pub mod error;
pub mod matches;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use troth_core::{
  notify::Fanout,
  store::{MatchStore, UserDirectory},
};
use troth_engine::{BatchResolver, MatchService};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S, F> {
  pub service:  Arc<MatchService<S, F>>,
  pub resolver: Arc<BatchResolver<S>>,
}

impl<S, F> Clone for ApiState<S, F> {
  fn clone(&self) -> Self {
    Self {
      service:  Arc::clone(&self.service),
      resolver: Arc::clone(&self.resolver),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S, F>(state: ApiState<S, F>) -> Router<()>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  Router::new()
    // Lifecycle operations
    .route("/matches", get(matches::list::<S, F>))
    .route("/matches/{id}", get(matches::details::<S, F>))
    .route(
      "/matches/{id}/express-interest",
      post(matches::express_interest::<S, F>),
    )
    .route(
      "/matches/{id}/accept-interest",
      post(matches::accept_interest::<S, F>),
    )
    .route("/matches/{id}/like", post(matches::like::<S, F>))
    .route("/matches/{id}/pass", post(matches::pass::<S, F>))
    // Triggered by the external scheduler
    .route("/admin/run-matching", post(admin::run_matching::<S, F>))
    .with_state(state)
}
