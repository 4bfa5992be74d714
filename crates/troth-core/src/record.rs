//! MatchRecord — the central entity of the pipeline.
//!
//! One record exists per unordered user pair, ever. Records are created
//! exclusively by the batch resolver and mutated exclusively through the
//! lifecycle transition function; "deletion" is logical (status `rejected`
//! with both visibility flags cleared), never physical.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::Strategy;

// ─── Discriminants ───────────────────────────────────────────────────────────

/// How the record came to exist. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
  /// Only one side proposed the other; visible to side 2 only after side 1
  /// explicitly expresses interest.
  OneWayInterest,
  /// Both sides independently proposed each other in the same sweep.
  MutualAlgorithm,
}

/// A side's recorded first-round action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAction {
  Like,
  Pass,
}

/// A side's answer to a second-chance offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondChanceResponse {
  Like,
  StillPass,
}

/// Derived overall status. `Love` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
  Pending,
  Love,
  Rejected,
}

impl MatchStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }
}

/// Why a record was logically removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedReason {
  /// Side 1 of a one-way record passed without ever expressing interest.
  NoInterest,
  /// Side 1 of a one-way record passed after expressing interest.
  InterestWithdrawn,
  /// Side 2 of a one-way record passed after interest was expressed.
  InterestDeclined,
  BothPassed,
  SecondChanceRejected,
}

// ─── Side ────────────────────────────────────────────────────────────────────

/// Which of the two per-side field sets applies to a participant. The
/// assignment is arbitrary but fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
  User1,
  User2,
}

impl Side {
  pub fn other(self) -> Self {
    match self {
      Self::User1 => Self::User2,
      Self::User2 => Self::User1,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::User1 => "user1",
      Self::User2 => "user2",
    }
  }
}

// ─── Pair key ────────────────────────────────────────────────────────────────

/// Deterministic key for an unordered user pair. Used to deduplicate
/// proposals within a sweep and enforced unique by the store, so a second
/// record for the same pair can never be inserted.
pub fn pair_key(a: Uuid, b: Uuid) -> String {
  let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
  format!("{lo}:{hi}")
}

// ─── MatchRecord ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
  pub match_id:   Uuid,
  pub pair_key:   String,
  pub user1_id:   Uuid,
  pub user2_id:   Uuid,
  pub match_type: MatchType,

  // Scoring provenance. One-way records populate only side 1.
  pub score1:         Option<u8>,
  pub algorithm1:     Option<Strategy>,
  pub reason1:        Option<String>,
  pub score2:         Option<u8>,
  pub algorithm2:     Option<Strategy>,
  pub reason2:        Option<String>,
  pub combined_score: Option<u8>,

  pub action1: Option<MatchAction>,
  pub action2: Option<MatchAction>,

  pub second_chance_offered1:  bool,
  pub second_chance_offered2:  bool,
  pub second_chance_response1: Option<SecondChanceResponse>,
  pub second_chance_response2: Option<SecondChanceResponse>,

  // One-way interest flow.
  pub user1_expressed_interest:   bool,
  pub user2_notified_of_interest: bool,

  pub match_status:  MatchStatus,
  pub chat_unlocked: bool,

  pub visible_to_user1: bool,
  pub visible_to_user2: bool,

  // Audit trail.
  pub last_action_by:        Option<Uuid>,
  pub last_action_at:        Option<DateTime<Utc>>,
  pub total_interactions:    i64,
  pub created_at:            DateTime<Utc>,
  pub interest_expressed_at: Option<DateTime<Utc>>,
  pub interest_responded_at: Option<DateTime<Utc>>,
  pub love_at:               Option<DateTime<Utc>>,
  pub deleted_at:            Option<DateTime<Utc>>,
  pub deleted_reason:        Option<DeletedReason>,

  // Consumed by the out-of-core batch notifier.
  pub notification_pending_user1: bool,
  pub notification_pending_user2: bool,
  pub notification_sent_user1:    bool,
  pub notification_sent_user2:    bool,

  /// Optimistic-concurrency token. Bumped by the store on every successful
  /// conditional update; a stale value makes the update fail.
  pub version: i64,
}

impl MatchRecord {
  fn blank(
    match_id:   Uuid,
    user1_id:   Uuid,
    user2_id:   Uuid,
    match_type: MatchType,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      match_id,
      pair_key: pair_key(user1_id, user2_id),
      user1_id,
      user2_id,
      match_type,
      score1: None,
      algorithm1: None,
      reason1: None,
      score2: None,
      algorithm2: None,
      reason2: None,
      combined_score: None,
      action1: None,
      action2: None,
      second_chance_offered1: false,
      second_chance_offered2: false,
      second_chance_response1: None,
      second_chance_response2: None,
      user1_expressed_interest: false,
      user2_notified_of_interest: false,
      match_status: MatchStatus::Pending,
      chat_unlocked: false,
      visible_to_user1: true,
      visible_to_user2: false,
      last_action_by: None,
      last_action_at: None,
      total_interactions: 0,
      created_at,
      interest_expressed_at: None,
      interest_responded_at: None,
      love_at: None,
      deleted_at: None,
      deleted_reason: None,
      notification_pending_user1: false,
      notification_pending_user2: false,
      notification_sent_user1: false,
      notification_sent_user2: false,
      version: 0,
    }
  }

  /// A one-way record: `proposer` scored `candidate`, the reverse proposal
  /// never happened. Hidden from side 2 until interest is expressed.
  #[allow(clippy::too_many_arguments)]
  pub fn new_one_way(
    match_id:   Uuid,
    proposer:   Uuid,
    candidate:  Uuid,
    score:      u8,
    algorithm:  Strategy,
    reason:     String,
    created_at: DateTime<Utc>,
  ) -> Self {
    let mut record =
      Self::blank(match_id, proposer, candidate, MatchType::OneWayInterest, created_at);
    record.score1 = Some(score);
    record.algorithm1 = Some(algorithm);
    record.reason1 = Some(reason);
    record.notification_pending_user1 = true;
    record
  }

  /// A mutual record: both sides proposed each other in the same sweep.
  /// Visible to both immediately; the combined score is the rounded mean.
  pub fn new_mutual(
    match_id:   Uuid,
    side1:      (Uuid, u8, Strategy, String),
    side2:      (Uuid, u8, Strategy, String),
    created_at: DateTime<Utc>,
  ) -> Self {
    let (user1_id, score1, algorithm1, reason1) = side1;
    let (user2_id, score2, algorithm2, reason2) = side2;
    let mut record =
      Self::blank(match_id, user1_id, user2_id, MatchType::MutualAlgorithm, created_at);
    record.score1 = Some(score1);
    record.algorithm1 = Some(algorithm1);
    record.reason1 = Some(reason1);
    record.score2 = Some(score2);
    record.algorithm2 = Some(algorithm2);
    record.reason2 = Some(reason2);
    record.combined_score =
      Some(((f64::from(score1) + f64::from(score2)) / 2.0).round() as u8);
    record.visible_to_user2 = true;
    record.notification_pending_user1 = true;
    record.notification_pending_user2 = true;
    record
  }

  // ── Side accessors ────────────────────────────────────────────────────────

  /// Which side `user_id` is, or `None` for a non-participant.
  pub fn side_of(&self, user_id: Uuid) -> Option<Side> {
    if user_id == self.user1_id {
      Some(Side::User1)
    } else if user_id == self.user2_id {
      Some(Side::User2)
    } else {
      None
    }
  }

  pub fn user_on(&self, side: Side) -> Uuid {
    match side {
      Side::User1 => self.user1_id,
      Side::User2 => self.user2_id,
    }
  }

  pub fn action(&self, side: Side) -> Option<MatchAction> {
    match side {
      Side::User1 => self.action1,
      Side::User2 => self.action2,
    }
  }

  pub fn set_action(&mut self, side: Side, action: MatchAction) {
    match side {
      Side::User1 => self.action1 = Some(action),
      Side::User2 => self.action2 = Some(action),
    }
  }

  pub fn second_chance_offered(&self, side: Side) -> bool {
    match side {
      Side::User1 => self.second_chance_offered1,
      Side::User2 => self.second_chance_offered2,
    }
  }

  pub fn offer_second_chance(&mut self, side: Side) {
    match side {
      Side::User1 => self.second_chance_offered1 = true,
      Side::User2 => self.second_chance_offered2 = true,
    }
  }

  pub fn second_chance_response(&self, side: Side) -> Option<SecondChanceResponse> {
    match side {
      Side::User1 => self.second_chance_response1,
      Side::User2 => self.second_chance_response2,
    }
  }

  pub fn set_second_chance_response(
    &mut self,
    side: Side,
    response: SecondChanceResponse,
  ) {
    match side {
      Side::User1 => self.second_chance_response1 = Some(response),
      Side::User2 => self.second_chance_response2 = Some(response),
    }
  }

  pub fn visible_to(&self, side: Side) -> bool {
    match side {
      Side::User1 => self.visible_to_user1,
      Side::User2 => self.visible_to_user2,
    }
  }

  pub fn set_notification_pending(&mut self, side: Side) {
    match side {
      Side::User1 => self.notification_pending_user1 = true,
      Side::User2 => self.notification_pending_user2 = true,
    }
  }

  // ── Mutation bookkeeping ──────────────────────────────────────────────────

  /// Stamp the audit fields every mutating operation must refresh.
  pub fn touch(&mut self, actor: Uuid, now: DateTime<Utc>) {
    self.total_interactions += 1;
    self.last_action_by = Some(actor);
    self.last_action_at = Some(now);
  }

  /// Unlock the terminal success state.
  pub fn unlock_love(&mut self, now: DateTime<Utc>) {
    self.match_status = MatchStatus::Love;
    self.chat_unlocked = true;
    self.love_at = Some(now);
  }

  /// Logically remove the record: terminal `rejected`, hidden from both
  /// sides, reason and timestamp stamped.
  pub fn remove(&mut self, reason: DeletedReason, now: DateTime<Utc>) {
    self.match_status = MatchStatus::Rejected;
    self.chat_unlocked = false;
    self.visible_to_user1 = false;
    self.visible_to_user2 = false;
    self.deleted_at = Some(now);
    self.deleted_reason = Some(reason);
  }
}
