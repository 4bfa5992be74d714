//! Handler for `/admin/run-matching`.
//!
//! The cron-style scheduler is an external collaborator; this endpoint is
//! what it calls once per cycle.

use axum::{Json, extract::State};
use troth_core::{
  notify::Fanout,
  store::{MatchStore, UserDirectory},
};
use troth_engine::MatchRunSummary;

use crate::{ApiState, error::ApiError};

/// `POST /admin/run-matching` — run one full sweep and report what it did.
pub async fn run_matching<S, F>(
  State(state): State<ApiState<S, F>>,
) -> Result<Json<MatchRunSummary>, ApiError>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  let summary = state.resolver.run().await?;
  Ok(Json(summary))
}
