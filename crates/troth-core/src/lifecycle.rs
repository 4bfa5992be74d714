//! The match lifecycle state machine.
//!
//! Every user action is modelled as a pure transition
//! `(record, action, actor, now) → Transition | Error`. Callers apply the
//! resulting record with a version-keyed conditional update and retry from
//! fresh state on conflict; the transition itself never touches storage.
//!
//! Re-asserting an action a side has already recorded (a non-second-chance
//! like-after-like or pass-after-pass) is an idempotent no-op: the current
//! state is returned with no event, and nothing is mutated.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  notify::MatchEventKind,
  record::{
    DeletedReason, MatchAction, MatchRecord, MatchStatus, MatchType,
    SecondChanceResponse, Side,
  },
};

// ─── Actions ─────────────────────────────────────────────────────────────────

/// A user-initiated lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
  ExpressInterest,
  AcceptInterest,
  Like { second_chance: bool },
  Pass { second_chance: bool },
}

// ─── Transition ──────────────────────────────────────────────────────────────

/// The outcome of applying an action.
#[derive(Debug, Clone)]
pub struct Transition {
  /// The post-transition record. Identical to the input for an idempotent
  /// no-op (`event` is `None` and nothing should be persisted or emitted).
  pub record: MatchRecord,
  pub event:  Option<MatchEventKind>,
  /// Whether this transition created a new second-chance offer (on either
  /// side).
  pub second_chance_offered: bool,
}

impl Transition {
  pub fn is_love(&self) -> bool {
    self.record.match_status == MatchStatus::Love
  }

  pub fn is_deleted(&self) -> bool {
    self.record.match_status == MatchStatus::Rejected
  }

  fn noop(record: &MatchRecord) -> Self {
    Self {
      record: record.clone(),
      event: None,
      second_chance_offered: false,
    }
  }

  fn changed(
    record: MatchRecord,
    event: MatchEventKind,
    second_chance_offered: bool,
  ) -> Self {
    debug_assert!(
      record.chat_unlocked == (record.match_status == MatchStatus::Love),
      "chat_unlocked must track love status"
    );
    Self {
      record,
      event: Some(event),
      second_chance_offered,
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Apply `action` by `actor` to `record`.
pub fn apply(
  record: &MatchRecord,
  action: LifecycleAction,
  actor:  Uuid,
  now:    DateTime<Utc>,
) -> Result<Transition> {
  let side = record
    .side_of(actor)
    .ok_or(Error::Forbidden { match_id: record.match_id, user_id: actor })?;

  match action {
    LifecycleAction::ExpressInterest => express_interest(record, side, actor, now),
    LifecycleAction::AcceptInterest => accept_interest(record, side, actor, now),
    LifecycleAction::Like { second_chance } => {
      like(record, side, actor, second_chance, now)
    }
    LifecycleAction::Pass { second_chance } => {
      pass(record, side, actor, second_chance, now)
    }
  }
}

// ─── One-way transitions ─────────────────────────────────────────────────────

fn express_interest(
  record: &MatchRecord,
  side:   Side,
  actor:  Uuid,
  now:    DateTime<Utc>,
) -> Result<Transition> {
  if record.match_type != MatchType::OneWayInterest {
    return Err(Error::WrongMatchType(record.match_id));
  }
  if side != Side::User1 {
    return Err(Error::Forbidden { match_id: record.match_id, user_id: actor });
  }
  if record.user1_expressed_interest {
    return Err(Error::AlreadyExpressed(record.match_id));
  }
  if record.match_status.is_terminal() {
    return Err(Error::MatchClosed(record.match_id));
  }

  let mut next = record.clone();
  next.user1_expressed_interest = true;
  next.visible_to_user2 = true;
  next.user2_notified_of_interest = true;
  next.set_notification_pending(Side::User2);
  next.interest_expressed_at = Some(now);
  next.touch(actor, now);

  Ok(Transition::changed(next, MatchEventKind::StatusChange, false))
}

fn accept_interest(
  record: &MatchRecord,
  side:   Side,
  actor:  Uuid,
  now:    DateTime<Utc>,
) -> Result<Transition> {
  if record.match_type != MatchType::OneWayInterest {
    return Err(Error::WrongMatchType(record.match_id));
  }
  if side != Side::User2 {
    return Err(Error::Forbidden { match_id: record.match_id, user_id: actor });
  }
  if !record.user1_expressed_interest {
    return Err(Error::NoInterestToAccept(record.match_id));
  }
  // Re-accepting an already-accepted interest is a no-op.
  if record.match_status == MatchStatus::Love
    && record.action2 == Some(MatchAction::Like)
  {
    return Ok(Transition::noop(record));
  }
  if record.match_status.is_terminal() {
    return Err(Error::MatchClosed(record.match_id));
  }

  let mut next = record.clone();
  next.set_action(Side::User2, MatchAction::Like);
  next.interest_responded_at = Some(now);
  next.unlock_love(now);
  next.set_notification_pending(Side::User1);
  next.set_notification_pending(Side::User2);
  next.touch(actor, now);

  Ok(Transition::changed(next, MatchEventKind::LoveMatch, false))
}

// ─── Mutual transitions ──────────────────────────────────────────────────────

fn like(
  record:        &MatchRecord,
  side:          Side,
  actor:         Uuid,
  second_chance: bool,
  now:           DateTime<Utc>,
) -> Result<Transition> {
  if record.match_type != MatchType::MutualAlgorithm {
    return Err(Error::WrongMatchType(record.match_id));
  }

  if second_chance {
    return respond_second_chance(record, side, actor, SecondChanceResponse::Like, now);
  }

  if record.action(side) == Some(MatchAction::Like) {
    return Ok(Transition::noop(record));
  }
  if record.match_status.is_terminal() {
    return Err(Error::MatchClosed(record.match_id));
  }
  // A recorded pass can only be revisited through a second chance.
  if record.action(side) == Some(MatchAction::Pass) {
    return Err(Error::AlreadyActed(record.match_id));
  }

  let mut next = record.clone();
  next.set_action(side, MatchAction::Like);
  next.touch(actor, now);

  match next.action(side.other()) {
    Some(MatchAction::Like) => {
      next.unlock_love(now);
      next.set_notification_pending(side);
      next.set_notification_pending(side.other());
      Ok(Transition::changed(next, MatchEventKind::LoveMatch, false))
    }
    Some(MatchAction::Pass) => {
      // The other side passed earlier; the like earns them a second chance.
      next.offer_second_chance(side.other());
      next.set_notification_pending(side.other());
      Ok(Transition::changed(next, MatchEventKind::SecondChance, true))
    }
    None => {
      next.set_notification_pending(side.other());
      Ok(Transition::changed(next, MatchEventKind::StatusChange, false))
    }
  }
}

fn pass(
  record:        &MatchRecord,
  side:          Side,
  actor:         Uuid,
  second_chance: bool,
  now:           DateTime<Utc>,
) -> Result<Transition> {
  if record.match_type == MatchType::OneWayInterest {
    return pass_one_way(record, side, actor, second_chance, now);
  }

  if second_chance {
    return respond_second_chance(
      record,
      side,
      actor,
      SecondChanceResponse::StillPass,
      now,
    );
  }

  if record.action(side) == Some(MatchAction::Pass) {
    return Ok(Transition::noop(record));
  }
  if record.match_status.is_terminal() {
    return Err(Error::MatchClosed(record.match_id));
  }
  if record.action(side) == Some(MatchAction::Like) {
    return Err(Error::AlreadyActed(record.match_id));
  }

  let mut next = record.clone();
  next.set_action(side, MatchAction::Pass);
  next.touch(actor, now);

  match next.action(side.other()) {
    Some(MatchAction::Pass) => {
      next.remove(DeletedReason::BothPassed, now);
      Ok(Transition::changed(next, MatchEventKind::MatchRemoved, false))
    }
    Some(MatchAction::Like) => {
      // The other side liked; the caller gets one chance to reconsider.
      next.offer_second_chance(side);
      next.set_notification_pending(side);
      Ok(Transition::changed(next, MatchEventKind::SecondChance, true))
    }
    None => Ok(Transition::changed(next, MatchEventKind::StatusChange, false)),
  }
}

fn pass_one_way(
  record:        &MatchRecord,
  side:          Side,
  actor:         Uuid,
  second_chance: bool,
  now:           DateTime<Utc>,
) -> Result<Transition> {
  // One-way records never carry second-chance offers.
  if second_chance {
    return Err(Error::NoSecondChancePending(record.match_id));
  }
  if record.action(side) == Some(MatchAction::Pass) {
    return Ok(Transition::noop(record));
  }
  if record.match_status.is_terminal() {
    return Err(Error::MatchClosed(record.match_id));
  }

  let mut next = record.clone();
  match side {
    Side::User1 => {
      let reason = if record.user1_expressed_interest {
        DeletedReason::InterestWithdrawn
      } else {
        DeletedReason::NoInterest
      };
      next.set_action(Side::User1, MatchAction::Pass);
      next.remove(reason, now);
    }
    Side::User2 => {
      // Side 2 cannot act on a record it has never been shown.
      if !record.user1_expressed_interest {
        return Err(Error::MatchNotFound(record.match_id));
      }
      next.set_action(Side::User2, MatchAction::Pass);
      next.interest_responded_at = Some(now);
      next.remove(DeletedReason::InterestDeclined, now);
    }
  }
  next.touch(actor, now);

  Ok(Transition::changed(next, MatchEventKind::MatchRemoved, false))
}

// ─── Second chance ───────────────────────────────────────────────────────────

fn respond_second_chance(
  record:   &MatchRecord,
  side:     Side,
  actor:    Uuid,
  response: SecondChanceResponse,
  now:      DateTime<Utc>,
) -> Result<Transition> {
  if !record.second_chance_offered(side)
    || record.second_chance_response(side).is_some()
  {
    return Err(Error::NoSecondChancePending(record.match_id));
  }
  if record.match_status.is_terminal() {
    return Err(Error::MatchClosed(record.match_id));
  }

  let mut next = record.clone();
  next.set_second_chance_response(side, response);
  next.touch(actor, now);

  match response {
    SecondChanceResponse::Like => {
      // Accepting a second chance always unlocks love, whatever the other
      // side's first-round action was. The recorded pass stands; only the
      // response changes the effective outcome.
      next.unlock_love(now);
      next.set_notification_pending(side);
      next.set_notification_pending(side.other());
      Ok(Transition::changed(next, MatchEventKind::LoveMatch, false))
    }
    SecondChanceResponse::StillPass => {
      next.set_action(side, MatchAction::Pass);
      next.remove(DeletedReason::SecondChanceRejected, now);
      Ok(Transition::changed(next, MatchEventKind::MatchRemoved, false))
    }
  }
}
