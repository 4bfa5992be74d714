//! Lifecycle events and the fan-out boundary.
//!
//! The real-time channel is an external collaborator; this module defines
//! only the event payload it receives and the trait a transport implements.
//! Payloads are privacy-safe projections — no personality or contact data
//! ever crosses this boundary.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::record::{MatchRecord, MatchStatus, MatchType};

// ─── Event kinds ─────────────────────────────────────────────────────────────

/// What a lifecycle transition meant, from the clients' point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEventKind {
  /// A non-terminal state change (interest expressed, single-sided action).
  StatusChange,
  /// Both sides are in: chat is unlocked.
  LoveMatch,
  /// One side was offered a second chance.
  SecondChance,
  /// The record went terminal-rejected; clients should drop the entry.
  MatchRemoved,
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// The privacy-safe view of a record delivered to both participants.
#[derive(Debug, Clone, Serialize)]
pub struct MatchProjection {
  pub match_id:                 Uuid,
  pub user1_id:                 Uuid,
  pub user2_id:                 Uuid,
  pub match_type:               MatchType,
  pub match_status:             MatchStatus,
  pub chat_unlocked:            bool,
  pub score1:                   Option<u8>,
  pub score2:                   Option<u8>,
  pub combined_score:           Option<u8>,
  pub user1_expressed_interest: bool,
  pub second_chance_offered1:   bool,
  pub second_chance_offered2:   bool,
  pub visible_to_user1:         bool,
  pub visible_to_user2:         bool,
  pub created_at:               DateTime<Utc>,
  pub last_action_at:           Option<DateTime<Utc>>,
}

impl MatchProjection {
  pub fn of(record: &MatchRecord) -> Self {
    Self {
      match_id:                 record.match_id,
      user1_id:                 record.user1_id,
      user2_id:                 record.user2_id,
      match_type:               record.match_type,
      match_status:             record.match_status,
      chat_unlocked:            record.chat_unlocked,
      score1:                   record.score1,
      score2:                   record.score2,
      combined_score:           record.combined_score,
      user1_expressed_interest: record.user1_expressed_interest,
      second_chance_offered1:   record.second_chance_offered1,
      second_chance_offered2:   record.second_chance_offered2,
      visible_to_user1:         record.visible_to_user1,
      visible_to_user2:         record.visible_to_user2,
      created_at:               record.created_at,
      last_action_at:           record.last_action_at,
    }
  }
}

/// One delivered event.
#[derive(Debug, Clone, Serialize)]
pub struct MatchEvent {
  pub kind:        MatchEventKind,
  pub occurred_at: DateTime<Utc>,
  pub projection:  MatchProjection,
}

// ─── Fan-out trait ───────────────────────────────────────────────────────────

/// The external real-time channel, keyed per user. Implementations decide
/// transport; callers treat every failure as non-fatal.
pub trait Fanout: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Deliver `event` to the channel entry for `user_id`.
  fn deliver<'a>(
    &'a self,
    user_id: Uuid,
    event: &'a MatchEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retract the channel entry for `match_id` under `user_id`, after the
  /// record went terminal.
  fn retract(
    &self,
    user_id: Uuid,
    match_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
