//! Store traits implemented by persistence backends.
//!
//! Both traits return [`crate::Error`] directly rather than an opaque
//! backend error type: the lifecycle engine's retry loop must distinguish
//! [`crate::Error::VersionConflict`] from everything else, so the error
//! vocabulary is part of the contract. Backends map their transport
//! failures onto `Unavailable` (retryable) or `Internal`.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Result, record::{MatchRecord, Side}, user::User};

// ─── User pool ───────────────────────────────────────────────────────────────

/// Read-only access to the user pool owned by the external profile service.
pub trait UserDirectory: Send + Sync {
  /// All users eligible for the batch sweep: active, analysis complete.
  fn active_analyzed_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>>> + Send + '_;

  /// Single-user lookup. Returns `None` if unknown.
  fn user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>>> + Send + '_;
}

// ─── Match records ───────────────────────────────────────────────────────────

/// Persistence for match records.
///
/// Creation is a pure insert — an existing `pair_key` is never overwritten.
/// Mutation goes through [`MatchStore::update_match`], a conditional write
/// keyed on the record's `version`; a stale version fails with
/// `VersionConflict` and the caller retries from fresh state.
pub trait MatchStore: Send + Sync {
  /// Fetch one record by id. Returns `None` if absent.
  fn match_record(
    &self,
    match_id: Uuid,
  ) -> impl Future<Output = Result<Option<MatchRecord>>> + Send + '_;

  /// Every record the user appears in, any status, any age. This is the
  /// full history the batch resolver filters against.
  fn matches_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MatchRecord>>> + Send + '_;

  /// Records currently visible to the user (their side's visibility flag
  /// is set).
  fn visible_matches(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MatchRecord>>> + Send + '_;

  /// How many records involving the user were created at or after `since`.
  /// Drives the daily proposal budget.
  fn count_created_since(
    &self,
    user_id: Uuid,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64>> + Send + '_;

  /// Insert a batch of freshly-created records in one atomic write. Any
  /// failure (including a duplicate `pair_key`) leaves nothing behind.
  fn insert_matches(
    &self,
    records: Vec<MatchRecord>,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Conditionally replace the stored record where the stored `version`
  /// equals `record.version`; the stored version is bumped by one. Returns
  /// the record as persisted, `VersionConflict` on a stale version, or
  /// `MatchNotFound`.
  fn update_match<'a>(
    &'a self,
    record: &'a MatchRecord,
  ) -> impl Future<Output = Result<MatchRecord>> + Send + 'a;

  /// Records with a pending-notification flag on either side, for the
  /// out-of-core batch notifier.
  fn pending_notifications(
    &self,
  ) -> impl Future<Output = Result<Vec<MatchRecord>>> + Send + '_;

  /// Clear a side's pending flag and set its sent flag. Bumps the record
  /// version so an in-flight lifecycle update retries instead of clobbering
  /// the bookkeeping.
  fn mark_notification_sent(
    &self,
    match_id: Uuid,
    side: Side,
  ) -> impl Future<Output = Result<()>> + Send + '_;
}
