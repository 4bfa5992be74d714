//! Error types for `troth-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("match not found: {0}")]
  MatchNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("user {user_id} may not act on match {match_id}")]
  Forbidden { match_id: Uuid, user_id: Uuid },

  #[error("operation is not valid for the type of match {0}")]
  WrongMatchType(Uuid),

  #[error("interest already expressed on match {0}")]
  AlreadyExpressed(Uuid),

  #[error("no interest to accept on match {0}")]
  NoInterestToAccept(Uuid),

  #[error("no second chance pending on match {0}")]
  NoSecondChancePending(Uuid),

  #[error("match {0} already has an action recorded for this side")]
  AlreadyActed(Uuid),

  #[error("match {0} is closed")]
  MatchClosed(Uuid),

  #[error("match {0} was modified concurrently")]
  VersionConflict(Uuid),

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("storage unavailable: {0}")]
  Unavailable(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("internal error: {0}")]
  Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Kind taxonomy ───────────────────────────────────────────────────────────

/// The stable failure classification surfaced to callers. Higher layers map
/// kinds, never concrete variants, onto their own vocabulary (HTTP statuses,
/// retry decisions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Missing or malformed input; never retried.
  Validation,
  NotFound,
  Forbidden,
  /// A state precondition was violated. Safe to re-read and retry at the
  /// caller's discretion.
  Conflict,
  /// Transient persistence failure; the whole operation is safe to retry.
  Unavailable,
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Validation => "validation",
      Self::NotFound => "not_found",
      Self::Forbidden => "forbidden",
      Self::Conflict => "conflict",
      Self::Unavailable => "unavailable",
      Self::Internal => "internal",
    }
  }
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::MatchNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::Forbidden { .. } => ErrorKind::Forbidden,
      Self::WrongMatchType(_)
      | Self::AlreadyExpressed(_)
      | Self::NoInterestToAccept(_)
      | Self::NoSecondChancePending(_)
      | Self::AlreadyActed(_)
      | Self::MatchClosed(_)
      | Self::VersionConflict(_) => ErrorKind::Conflict,
      Self::Validation(_) => ErrorKind::Validation,
      Self::Unavailable(_) => ErrorKind::Unavailable,
      Self::Serialization(_) | Self::Internal(_) => ErrorKind::Internal,
    }
  }
}
