//! Handlers for `/matches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches` | `?user_id` required; records visible to that user |
//! | `GET`  | `/matches/:id` | `?user_id` required; record + caller's side |
//! | `POST` | `/matches/:id/express-interest` | Body: [`ActorBody`] |
//! | `POST` | `/matches/:id/accept-interest` | Body: [`ActorBody`] |
//! | `POST` | `/matches/:id/like` | Body: [`ActionBody`] |
//! | `POST` | `/matches/:id/pass` | Body: [`ActionBody`] |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use troth_core::{
  notify::Fanout,
  record::{MatchRecord, Side},
  store::{MatchStore, UserDirectory},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// JSON body naming the acting user.
#[derive(Debug, Deserialize)]
pub struct ActorBody {
  pub user_id: Uuid,
}

/// JSON body for `like` and `pass`.
#[derive(Debug, Deserialize)]
pub struct ActionBody {
  pub user_id:       Uuid,
  /// Set when the caller is answering a second-chance offer.
  #[serde(default)]
  pub second_chance: bool,
}

#[derive(Debug, Deserialize)]
pub struct CallerParams {
  pub user_id: Uuid,
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
  pub record:        MatchRecord,
  pub is_love_match: bool,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
  pub record:                MatchRecord,
  pub is_love_match:         bool,
  pub second_chance_offered: bool,
}

#[derive(Debug, Serialize)]
pub struct PassResponse {
  pub record:                MatchRecord,
  pub is_deleted:            bool,
  pub second_chance_offered: bool,
}

#[derive(Debug, Serialize)]
pub struct DetailsResponse {
  pub record: MatchRecord,
  pub side:   Side,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `GET /matches?user_id=<id>`
pub async fn list<S, F>(
  State(state): State<ApiState<S, F>>,
  Query(params): Query<CallerParams>,
) -> Result<Json<Vec<MatchRecord>>, ApiError>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  let records = state.service.visible_matches(params.user_id).await?;
  Ok(Json(records))
}

/// `GET /matches/:id?user_id=<id>`
pub async fn details<S, F>(
  State(state): State<ApiState<S, F>>,
  Path(match_id): Path<Uuid>,
  Query(params): Query<CallerParams>,
) -> Result<Json<DetailsResponse>, ApiError>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  let details = state.service.match_details(match_id, params.user_id).await?;
  Ok(Json(DetailsResponse { record: details.record, side: details.side }))
}

/// `POST /matches/:id/express-interest`
pub async fn express_interest<S, F>(
  State(state): State<ApiState<S, F>>,
  Path(match_id): Path<Uuid>,
  Json(body): Json<ActorBody>,
) -> Result<Json<MatchRecord>, ApiError>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  let record = state.service.express_interest(match_id, body.user_id).await?;
  Ok(Json(record))
}

/// `POST /matches/:id/accept-interest`
pub async fn accept_interest<S, F>(
  State(state): State<ApiState<S, F>>,
  Path(match_id): Path<Uuid>,
  Json(body): Json<ActorBody>,
) -> Result<Json<AcceptResponse>, ApiError>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  let outcome = state.service.accept_interest(match_id, body.user_id).await?;
  Ok(Json(AcceptResponse {
    record:        outcome.record,
    is_love_match: outcome.is_love_match,
  }))
}

/// `POST /matches/:id/like`
pub async fn like<S, F>(
  State(state): State<ApiState<S, F>>,
  Path(match_id): Path<Uuid>,
  Json(body): Json<ActionBody>,
) -> Result<Json<LikeResponse>, ApiError>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  let outcome = state
    .service
    .like(match_id, body.user_id, body.second_chance)
    .await?;
  Ok(Json(LikeResponse {
    record:                outcome.record,
    is_love_match:         outcome.is_love_match,
    second_chance_offered: outcome.second_chance_offered,
  }))
}

/// `POST /matches/:id/pass`
pub async fn pass<S, F>(
  State(state): State<ApiState<S, F>>,
  Path(match_id): Path<Uuid>,
  Json(body): Json<ActionBody>,
) -> Result<Json<PassResponse>, ApiError>
where
  S: MatchStore + UserDirectory + 'static,
  F: Fanout + 'static,
{
  let outcome = state
    .service
    .pass(match_id, body.user_id, body.second_chance)
    .await?;
  Ok(Json(PassResponse {
    record:                outcome.record,
    is_deleted:            outcome.is_deleted,
    second_chance_offered: outcome.second_chance_offered,
  }))
}
