//! Candidate scoring: four per-user strategies plus two universal
//! adjustments (shared city, age proximity).
//!
//! Scores are computed in `f64` and only rounded and clamped once, at the
//! end, so the locality multiplier and the age bonus compose the same way
//! regardless of strategy. Every returned score is an integer in [0, 100].

use uuid::Uuid;

use crate::user::{Strategy, User};

/// Traits beyond this band count as high for the polarity bonuses.
const POLARITY_HIGH: f64 = 70.0;
/// Traits below this band count as low for the polarity bonuses.
const POLARITY_LOW: f64 = 30.0;

/// Placeholder terms the deal-breaker strategy looks for. A real matcher
/// against candidate attributes never shipped; see DESIGN.md.
const DEAL_BREAKER_TERMS: [&str; 2] = ["smoking", "drinking"];

// ─── Output ──────────────────────────────────────────────────────────────────

/// A scored pairing proposal from the acting user's point of view.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
  pub candidate_id: Uuid,
  pub score:        u8,
  pub strategy:     Strategy,
  pub reason:       String,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Score `candidate` for `user` under the user's chosen strategy.
pub fn score_candidate(user: &User, candidate: &User) -> ScoredCandidate {
  let strategy = user.strategy;
  let base = match strategy {
    Strategy::Similarity => similarity_base(user, candidate),
    Strategy::Complementary => complementary_base(user, candidate),
    Strategy::MultiDimensional => multi_dimensional_base(user, candidate),
    Strategy::DealBreaker => deal_breaker_base(user),
  };

  let adjusted = age_bonus(user, candidate, locality_bonus(user, candidate, base));
  let score = adjusted.round().clamp(0.0, 100.0) as u8;

  ScoredCandidate {
    candidate_id: candidate.user_id,
    score,
    strategy,
    reason: reason_for(strategy).to_owned(),
  }
}

fn reason_for(strategy: Strategy) -> &'static str {
  match strategy {
    Strategy::Similarity => "Similar personality profiles",
    Strategy::Complementary => "Complementary personality balance",
    Strategy::MultiDimensional => "Strong fit across several dimensions",
    Strategy::DealBreaker => "Clear of stated deal-breakers",
  }
}

// ─── Strategy bases ──────────────────────────────────────────────────────────

/// Rewards low mean absolute difference across the five traits. Falls back
/// to a neutral 50 when either side lacks an analysis.
fn similarity_base(user: &User, candidate: &User) -> f64 {
  let mut score = 50.0;
  if let (Some(a), Some(b)) = (&user.traits, &candidate.traits) {
    let mean_diff = a
      .as_array()
      .iter()
      .zip(b.as_array())
      .map(|(x, y)| (x - y).abs())
      .sum::<f64>()
      / 5.0;
    score = 100.0 - 2.0 * mean_diff;
  }
  if let (Some(a), Some(b)) =
    (&user.relationship_status, &candidate.relationship_status)
    && a == b
  {
    score += 5.0;
  }
  score.clamp(0.0, 100.0)
}

/// Rewards trait pairs that average out near the middle of the scale, plus
/// a bonus for opposite extremes on extraversion and neuroticism.
fn complementary_base(user: &User, candidate: &User) -> f64 {
  let mut score = 50.0;
  if let (Some(a), Some(b)) = (&user.traits, &candidate.traits) {
    score = a
      .as_array()
      .iter()
      .zip(b.as_array())
      .map(|(x, y)| 100.0 - 2.0 * ((x + y) / 2.0 - 50.0).abs())
      .sum::<f64>()
      / 5.0;

    if polar_opposites(a.extraversion, b.extraversion) {
      score += 10.0;
    }
    if polar_opposites(a.neuroticism, b.neuroticism) {
      score += 10.0;
    }
  }
  score.clamp(0.0, 100.0)
}

fn polar_opposites(x: f64, y: f64) -> bool {
  (x > POLARITY_HIGH && y < POLARITY_LOW)
    || (x < POLARITY_LOW && y > POLARITY_HIGH)
}

/// Mean of the similarity and complementary scores, plus attachment-style
/// and communication-style bonuses.
fn multi_dimensional_base(user: &User, candidate: &User) -> f64 {
  let mut score =
    (similarity_base(user, candidate) + complementary_base(user, candidate)) / 2.0;

  if let (Some(a), Some(b)) =
    (&user.attachment_style, &candidate.attachment_style)
    && a == b
  {
    score += 10.0;
  }

  let described = |s: &Option<String>| {
    s.as_deref().is_some_and(|v| !v.trim().is_empty())
  };
  if described(&user.communication_style)
    && described(&candidate.communication_style)
  {
    score += 5.0;
  }

  score.clamp(0.0, 100.0)
}

/// Coarse by design: checks the acting user's own lists against two fixed
/// placeholder terms, ignoring the candidate entirely.
fn deal_breaker_base(user: &User) -> f64 {
  let mut score: f64 = 70.0;
  let has_term = user.deal_breakers.iter().any(|d| {
    DEAL_BREAKER_TERMS
      .iter()
      .any(|t| d.eq_ignore_ascii_case(t))
  });
  if has_term {
    score += 10.0;
  }
  if !user.must_haves.is_empty() {
    score += 10.0;
  }
  score.clamp(0.0, 100.0)
}

// ─── Universal adjustments ───────────────────────────────────────────────────

/// Same city (case-insensitive exact match) multiplies the score by 1.3,
/// capped at 100.
fn locality_bonus(user: &User, candidate: &User, score: f64) -> f64 {
  match (&user.city, &candidate.city) {
    (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => (score * 1.3).min(100.0),
    _ => score,
  }
}

/// Flat bonus for age proximity, applied after the locality multiplier and
/// still capped at 100.
fn age_bonus(user: &User, candidate: &User, score: f64) -> f64 {
  let diff = (i16::from(user.age) - i16::from(candidate.age)).abs();
  let bonus = match diff {
    0..=2 => 10.0,
    3..=5 => 5.0,
    6..=10 => 2.0,
    _ => 0.0,
  };
  (score + bonus).min(100.0)
}
