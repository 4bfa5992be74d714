//! MatchService — the online match lifecycle engine.
//!
//! Each operation is a read-modify-write on exactly one record: load, apply
//! the pure transition from [`troth_core::lifecycle`], then persist with
//! the version-keyed conditional update. A concurrent writer makes the
//! update fail with `VersionConflict`, and the whole sequence retries from
//! fresh state; after a few lost races the operation surfaces as
//! retryable `Unavailable`.

use std::sync::Arc;

use chrono::Utc;
use troth_core::{
  Error, Result,
  lifecycle::{self, LifecycleAction, Transition},
  notify::Fanout,
  record::{MatchRecord, Side},
  store::MatchStore,
};
use uuid::Uuid;

use crate::emitter::NotificationEmitter;

/// Lost-race retries before giving up. Each retry re-reads fresh state, so
/// losing this many in a row means the record is under real contention.
const MAX_CAS_RETRIES: u32 = 3;

// ─── Outcomes ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AcceptOutcome {
  pub record:        MatchRecord,
  pub is_love_match: bool,
}

#[derive(Debug)]
pub struct LikeOutcome {
  pub record:                MatchRecord,
  pub is_love_match:         bool,
  pub second_chance_offered: bool,
}

#[derive(Debug)]
pub struct PassOutcome {
  pub record:                MatchRecord,
  pub is_deleted:            bool,
  pub second_chance_offered: bool,
}

#[derive(Debug)]
pub struct MatchDetails {
  pub record: MatchRecord,
  /// Which side of the record the caller is.
  pub side:   Side,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct MatchService<S, F> {
  store:   Arc<S>,
  emitter: NotificationEmitter<F>,
}

impl<S, F> MatchService<S, F>
where
  S: MatchStore,
  F: Fanout + 'static,
{
  pub fn new(store: Arc<S>, emitter: NotificationEmitter<F>) -> Self {
    Self { store, emitter }
  }

  // ── Operations ────────────────────────────────────────────────────────────

  pub async fn express_interest(
    &self,
    match_id: Uuid,
    user_id: Uuid,
  ) -> Result<MatchRecord> {
    let t = self
      .apply_action(match_id, user_id, LifecycleAction::ExpressInterest)
      .await?;
    Ok(t.record)
  }

  pub async fn accept_interest(
    &self,
    match_id: Uuid,
    user_id: Uuid,
  ) -> Result<AcceptOutcome> {
    let t = self
      .apply_action(match_id, user_id, LifecycleAction::AcceptInterest)
      .await?;
    Ok(AcceptOutcome { is_love_match: t.is_love(), record: t.record })
  }

  pub async fn like(
    &self,
    match_id: Uuid,
    user_id: Uuid,
    second_chance: bool,
  ) -> Result<LikeOutcome> {
    let t = self
      .apply_action(match_id, user_id, LifecycleAction::Like { second_chance })
      .await?;
    Ok(LikeOutcome {
      is_love_match:         t.is_love(),
      second_chance_offered: t.second_chance_offered,
      record:                t.record,
    })
  }

  pub async fn pass(
    &self,
    match_id: Uuid,
    user_id: Uuid,
    second_chance: bool,
  ) -> Result<PassOutcome> {
    let t = self
      .apply_action(match_id, user_id, LifecycleAction::Pass { second_chance })
      .await?;
    Ok(PassOutcome {
      is_deleted:            t.is_deleted(),
      second_chance_offered: t.second_chance_offered,
      record:                t.record,
    })
  }

  /// Read-only view. A record hidden from the caller's side reads as
  /// missing; a record the caller is no side of is forbidden.
  pub async fn match_details(
    &self,
    match_id: Uuid,
    user_id: Uuid,
  ) -> Result<MatchDetails> {
    let record = self
      .store
      .match_record(match_id)
      .await?
      .ok_or(Error::MatchNotFound(match_id))?;

    let side = record
      .side_of(user_id)
      .ok_or(Error::Forbidden { match_id, user_id })?;

    if !record.visible_to(side) {
      return Err(Error::MatchNotFound(match_id));
    }

    Ok(MatchDetails { record, side })
  }

  /// Every record currently visible to the user.
  pub async fn visible_matches(&self, user_id: Uuid) -> Result<Vec<MatchRecord>> {
    self.store.visible_matches(user_id).await
  }

  // ── Optimistic-concurrency loop ───────────────────────────────────────────

  async fn apply_action(
    &self,
    match_id: Uuid,
    user_id: Uuid,
    action: LifecycleAction,
  ) -> Result<Transition> {
    for attempt in 0..MAX_CAS_RETRIES {
      let record = self
        .store
        .match_record(match_id)
        .await?
        .ok_or(Error::MatchNotFound(match_id))?;

      let mut transition = lifecycle::apply(&record, action, user_id, Utc::now())?;

      // Idempotent no-op: nothing to persist, nothing to emit.
      let Some(event) = transition.event else {
        return Ok(transition);
      };

      match self.store.update_match(&transition.record).await {
        Ok(stored) => {
          transition.record = stored;
          self.emitter.emit(&transition.record, event).await;
          return Ok(transition);
        }
        Err(Error::VersionConflict(_)) => {
          tracing::debug!(
            %match_id,
            %user_id,
            attempt,
            "lost a concurrent update, retrying from fresh state"
          );
        }
        Err(e) => return Err(e),
      }
    }

    Err(Error::Unavailable(format!(
      "match {match_id} kept changing concurrently"
    )))
  }
}
