//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Trait scores and string
//! lists are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings. Enum columns store the snake_case discriminant.

use chrono::{DateTime, Utc};
use troth_core::{
  Error, Result,
  record::{
    DeletedReason, MatchAction, MatchRecord, MatchStatus, MatchType,
    SecondChanceResponse,
  },
  user::{Gender, RelationshipGoal, Seeking, Strategy, TraitScores, User},
};
use uuid::Uuid;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Internal(format!("bad uuid {s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Internal(format!("bad timestamp {s:?}: {e}")))
}

fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── User enums ──────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str {
  match g {
    Gender::Male => "male",
    Gender::Female => "female",
    Gender::NonBinary => "non_binary",
    Gender::Other => "other",
  }
}

pub fn decode_gender(s: &str) -> Result<Gender> {
  Gender::parse(s).ok_or_else(|| Error::Internal(format!("unknown gender: {s:?}")))
}

pub fn encode_seeking(s: Seeking) -> &'static str {
  match s {
    Seeking::Male => "male",
    Seeking::Female => "female",
    Seeking::NonBinary => "non_binary",
    Seeking::Other => "other",
    Seeking::Everyone => "everyone",
  }
}

pub fn decode_seeking(s: &str) -> Result<Seeking> {
  Seeking::parse(s).ok_or_else(|| Error::Internal(format!("unknown seeking: {s:?}")))
}

pub fn encode_goal(g: RelationshipGoal) -> &'static str {
  match g {
    RelationshipGoal::Friendship => "friendship",
    RelationshipGoal::Dating => "dating",
    RelationshipGoal::Both => "both",
  }
}

pub fn decode_goal(s: &str) -> Result<RelationshipGoal> {
  RelationshipGoal::parse(s)
    .ok_or_else(|| Error::Internal(format!("unknown goal: {s:?}")))
}

pub fn encode_strategy(s: Strategy) -> &'static str {
  match s {
    Strategy::Similarity => "similarity",
    Strategy::Complementary => "complementary",
    Strategy::MultiDimensional => "multi_dimensional",
    Strategy::DealBreaker => "deal_breaker",
  }
}

pub fn decode_strategy(s: &str) -> Result<Strategy> {
  match s {
    "similarity" => Ok(Strategy::Similarity),
    "complementary" => Ok(Strategy::Complementary),
    "multi_dimensional" => Ok(Strategy::MultiDimensional),
    "deal_breaker" => Ok(Strategy::DealBreaker),
    other => Err(Error::Internal(format!("unknown strategy: {other:?}"))),
  }
}

// ─── Match enums ─────────────────────────────────────────────────────────────

pub fn encode_match_type(t: MatchType) -> &'static str {
  match t {
    MatchType::OneWayInterest => "one_way_interest",
    MatchType::MutualAlgorithm => "mutual_algorithm",
  }
}

pub fn decode_match_type(s: &str) -> Result<MatchType> {
  match s {
    "one_way_interest" => Ok(MatchType::OneWayInterest),
    "mutual_algorithm" => Ok(MatchType::MutualAlgorithm),
    other => Err(Error::Internal(format!("unknown match type: {other:?}"))),
  }
}

pub fn encode_action(a: MatchAction) -> &'static str {
  match a {
    MatchAction::Like => "like",
    MatchAction::Pass => "pass",
  }
}

pub fn decode_action(s: &str) -> Result<MatchAction> {
  match s {
    "like" => Ok(MatchAction::Like),
    "pass" => Ok(MatchAction::Pass),
    other => Err(Error::Internal(format!("unknown action: {other:?}"))),
  }
}

pub fn encode_status(s: MatchStatus) -> &'static str {
  match s {
    MatchStatus::Pending => "pending",
    MatchStatus::Love => "love",
    MatchStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<MatchStatus> {
  match s {
    "pending" => Ok(MatchStatus::Pending),
    "love" => Ok(MatchStatus::Love),
    "rejected" => Ok(MatchStatus::Rejected),
    other => Err(Error::Internal(format!("unknown status: {other:?}"))),
  }
}

pub fn encode_sc_response(r: SecondChanceResponse) -> &'static str {
  match r {
    SecondChanceResponse::Like => "like",
    SecondChanceResponse::StillPass => "still_pass",
  }
}

pub fn decode_sc_response(s: &str) -> Result<SecondChanceResponse> {
  match s {
    "like" => Ok(SecondChanceResponse::Like),
    "still_pass" => Ok(SecondChanceResponse::StillPass),
    other => {
      Err(Error::Internal(format!("unknown second-chance response: {other:?}")))
    }
  }
}

pub fn encode_deleted_reason(r: DeletedReason) -> &'static str {
  match r {
    DeletedReason::NoInterest => "no_interest",
    DeletedReason::InterestWithdrawn => "interest_withdrawn",
    DeletedReason::InterestDeclined => "interest_declined",
    DeletedReason::BothPassed => "both_passed",
    DeletedReason::SecondChanceRejected => "second_chance_rejected",
  }
}

pub fn decode_deleted_reason(s: &str) -> Result<DeletedReason> {
  match s {
    "no_interest" => Ok(DeletedReason::NoInterest),
    "interest_withdrawn" => Ok(DeletedReason::InterestWithdrawn),
    "interest_declined" => Ok(DeletedReason::InterestDeclined),
    "both_passed" => Ok(DeletedReason::BothPassed),
    "second_chance_rejected" => Ok(DeletedReason::SecondChanceRejected),
    other => Err(Error::Internal(format!("unknown deleted reason: {other:?}"))),
  }
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_traits(t: &Option<TraitScores>) -> Result<Option<String>> {
  t.as_ref()
    .map(|v| serde_json::to_string(v).map_err(Error::from))
    .transpose()
}

pub fn decode_traits(s: Option<&str>) -> Result<Option<TraitScores>> {
  s.map(|v| serde_json::from_str(v).map_err(Error::from)).transpose()
}

pub fn encode_string_list(list: &[String]) -> Result<String> {
  serde_json::to_string(list).map_err(Error::from)
}

pub fn decode_string_list(s: &str) -> Result<Vec<String>> {
  serde_json::from_str(s).map_err(Error::from)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:              String,
  pub gender:               String,
  pub seeking:              String,
  pub goal:                 String,
  pub city:                 Option<String>,
  pub age:                  i64,
  pub strategy:             String,
  pub traits_json:          Option<String>,
  pub relationship_status:  Option<String>,
  pub attachment_style:     Option<String>,
  pub communication_style:  Option<String>,
  pub deal_breakers:        String,
  pub must_haves:           String,
  pub is_active:            bool,
  pub is_analysis_complete: bool,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:              decode_uuid(&self.user_id)?,
      gender:               decode_gender(&self.gender)?,
      seeking:              decode_seeking(&self.seeking)?,
      goal:                 decode_goal(&self.goal)?,
      city:                 self.city,
      age:                  u8::try_from(self.age)
        .map_err(|_| Error::Internal(format!("age out of range: {}", self.age)))?,
      strategy:             decode_strategy(&self.strategy)?,
      traits:               decode_traits(self.traits_json.as_deref())?,
      relationship_status:  self.relationship_status,
      attachment_style:     self.attachment_style,
      communication_style:  self.communication_style,
      deal_breakers:        decode_string_list(&self.deal_breakers)?,
      must_haves:           decode_string_list(&self.must_haves)?,
      is_active:            self.is_active,
      is_analysis_complete: self.is_analysis_complete,
    })
  }
}

/// Raw values read directly from a `matches` row.
pub struct RawMatch {
  pub match_id:                   String,
  pub pair_key:                   String,
  pub user1_id:                   String,
  pub user2_id:                   String,
  pub match_type:                 String,
  pub score1:                     Option<i64>,
  pub algorithm1:                 Option<String>,
  pub reason1:                    Option<String>,
  pub score2:                     Option<i64>,
  pub algorithm2:                 Option<String>,
  pub reason2:                    Option<String>,
  pub combined_score:             Option<i64>,
  pub action1:                    Option<String>,
  pub action2:                    Option<String>,
  pub second_chance_offered1:     bool,
  pub second_chance_offered2:     bool,
  pub second_chance_response1:    Option<String>,
  pub second_chance_response2:    Option<String>,
  pub user1_expressed_interest:   bool,
  pub user2_notified_of_interest: bool,
  pub match_status:               String,
  pub chat_unlocked:              bool,
  pub visible_to_user1:           bool,
  pub visible_to_user2:           bool,
  pub last_action_by:             Option<String>,
  pub last_action_at:             Option<String>,
  pub total_interactions:         i64,
  pub created_at:                 String,
  pub interest_expressed_at:      Option<String>,
  pub interest_responded_at:      Option<String>,
  pub love_at:                    Option<String>,
  pub deleted_at:                 Option<String>,
  pub deleted_reason:             Option<String>,
  pub notification_pending_user1: bool,
  pub notification_pending_user2: bool,
  pub notification_sent_user1:    bool,
  pub notification_sent_user2:    bool,
  pub version:                    i64,
}

fn decode_score(v: Option<i64>) -> Result<Option<u8>> {
  v.map(|n| {
    u8::try_from(n).map_err(|_| Error::Internal(format!("score out of range: {n}")))
  })
  .transpose()
}

impl RawMatch {
  pub fn into_record(self) -> Result<MatchRecord> {
    Ok(MatchRecord {
      match_id:   decode_uuid(&self.match_id)?,
      pair_key:   self.pair_key,
      user1_id:   decode_uuid(&self.user1_id)?,
      user2_id:   decode_uuid(&self.user2_id)?,
      match_type: decode_match_type(&self.match_type)?,

      score1:         decode_score(self.score1)?,
      algorithm1:     self.algorithm1.as_deref().map(decode_strategy).transpose()?,
      reason1:        self.reason1,
      score2:         decode_score(self.score2)?,
      algorithm2:     self.algorithm2.as_deref().map(decode_strategy).transpose()?,
      reason2:        self.reason2,
      combined_score: decode_score(self.combined_score)?,

      action1: self.action1.as_deref().map(decode_action).transpose()?,
      action2: self.action2.as_deref().map(decode_action).transpose()?,

      second_chance_offered1:  self.second_chance_offered1,
      second_chance_offered2:  self.second_chance_offered2,
      second_chance_response1: self
        .second_chance_response1
        .as_deref()
        .map(decode_sc_response)
        .transpose()?,
      second_chance_response2: self
        .second_chance_response2
        .as_deref()
        .map(decode_sc_response)
        .transpose()?,

      user1_expressed_interest:   self.user1_expressed_interest,
      user2_notified_of_interest: self.user2_notified_of_interest,

      match_status:  decode_status(&self.match_status)?,
      chat_unlocked: self.chat_unlocked,

      visible_to_user1: self.visible_to_user1,
      visible_to_user2: self.visible_to_user2,

      last_action_by:        decode_opt_uuid(self.last_action_by.as_deref())?,
      last_action_at:        decode_opt_dt(self.last_action_at.as_deref())?,
      total_interactions:    self.total_interactions,
      created_at:            decode_dt(&self.created_at)?,
      interest_expressed_at: decode_opt_dt(self.interest_expressed_at.as_deref())?,
      interest_responded_at: decode_opt_dt(self.interest_responded_at.as_deref())?,
      love_at:               decode_opt_dt(self.love_at.as_deref())?,
      deleted_at:            decode_opt_dt(self.deleted_at.as_deref())?,
      deleted_reason:        self
        .deleted_reason
        .as_deref()
        .map(decode_deleted_reason)
        .transpose()?,

      notification_pending_user1: self.notification_pending_user1,
      notification_pending_user2: self.notification_pending_user2,
      notification_sent_user1:    self.notification_sent_user1,
      notification_sent_user2:    self.notification_sent_user2,

      version: self.version,
    })
  }
}
