//! Batch Match Resolver — the scheduled sweep that turns the user pool
//! into persisted match records.
//!
//! One logical pass per cycle: every active, analysis-complete user gets up
//! to `daily_limit` proposals, proposals are reconciled by pair key into
//! mutual or one-way records, and all new records land in a single atomic
//! insert. A failure while processing one user skips that user and the
//! sweep continues; a failure of the final insert fails the whole cycle.

use std::{
  collections::HashMap,
  sync::Arc,
  time::Instant,
};

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use troth_core::{
  Result, compat,
  record::MatchRecord,
  score::{self, ScoredCandidate},
  store::{MatchStore, UserDirectory},
  user::{Strategy, User},
};
use uuid::Uuid;

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
  /// Maximum records created per user per calendar day (UTC).
  pub daily_limit:     u32,
  /// Minimum score for a proposal to survive.
  pub score_threshold: u8,
}

impl Default for ResolverConfig {
  fn default() -> Self {
    Self { daily_limit: 5, score_threshold: 30 }
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// What one sweep did; returned to the scheduler that triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRunSummary {
  pub users_processed: usize,
  pub users_skipped:   usize,
  pub records_created: usize,
  pub mutual_matches:  usize,
  pub one_way_matches: usize,
  pub duration_ms:     u64,
}

// ─── Proposal ────────────────────────────────────────────────────────────────

/// One direction of a potential pairing, before reconciliation.
struct Proposal {
  proposer:  Uuid,
  candidate: Uuid,
  score:     u8,
  strategy:  Strategy,
  reason:    String,
}

// ─── Resolver ────────────────────────────────────────────────────────────────

pub struct BatchResolver<S> {
  store:  Arc<S>,
  config: ResolverConfig,
}

impl<S> BatchResolver<S>
where
  S: MatchStore + UserDirectory,
{
  pub fn new(store: Arc<S>, config: ResolverConfig) -> Self {
    Self { store, config }
  }

  /// Run one full sweep.
  pub async fn run(&self) -> Result<MatchRunSummary> {
    let started = Instant::now();
    let now = Utc::now();
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();

    let pool = self.store.active_analyzed_users().await?;
    tracing::info!(pool_size = pool.len(), "starting match sweep");

    let mut proposals: Vec<Proposal> = Vec::new();
    let mut users_processed = 0usize;
    let mut users_skipped = 0usize;

    for user in &pool {
      match self.propose_for(user, &pool, midnight).await {
        Ok(Some(batch)) => {
          users_processed += 1;
          proposals.extend(batch);
        }
        Ok(None) => users_skipped += 1,
        Err(e) => {
          // One user's failure never takes down the sweep.
          tracing::warn!(
            user_id = %user.user_id,
            error = %e,
            "skipping user after per-user failure"
          );
          users_skipped += 1;
        }
      }
    }

    let records = reconcile(proposals, now);
    let mutual_matches = records
      .iter()
      .filter(|r| r.match_type == troth_core::record::MatchType::MutualAlgorithm)
      .count();
    let one_way_matches = records.len() - mutual_matches;
    let records_created = records.len();

    if !records.is_empty() {
      self.store.insert_matches(records).await?;
    }

    let summary = MatchRunSummary {
      users_processed,
      users_skipped,
      records_created,
      mutual_matches,
      one_way_matches,
      duration_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
      processed = summary.users_processed,
      skipped = summary.users_skipped,
      created = summary.records_created,
      mutual = summary.mutual_matches,
      one_way = summary.one_way_matches,
      duration_ms = summary.duration_ms,
      "match sweep finished"
    );
    Ok(summary)
  }

  /// Propose up to the user's remaining daily budget. `Ok(None)` means the
  /// budget is already spent.
  async fn propose_for(
    &self,
    user:     &User,
    pool:     &[User],
    midnight: DateTime<Utc>,
  ) -> Result<Option<Vec<Proposal>>> {
    let created_today =
      self.store.count_created_since(user.user_id, midnight).await?;
    let remaining =
      u64::from(self.config.daily_limit).saturating_sub(created_today);
    if remaining == 0 {
      return Ok(None);
    }

    let history = self.store.matches_for_user(user.user_id).await?;
    let candidates = compat::filter_candidates(user, pool, &history);

    let mut scored: Vec<ScoredCandidate> = candidates
      .into_iter()
      .map(|c| score::score_candidate(user, c))
      .filter(|s| s.score >= self.config.score_threshold)
      .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(remaining as usize);

    Ok(Some(
      scored
        .into_iter()
        .map(|s| Proposal {
          proposer:  user.user_id,
          candidate: s.candidate_id,
          score:     s.score,
          strategy:  s.strategy,
          reason:    s.reason,
        })
        .collect(),
    ))
  }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Group proposals by pair key: two (one from each side) make a mutual
/// record, a single one makes a one-way record. Each side keeps its own
/// score, strategy, and reason; no cross-side reconciliation happens beyond
/// the combined-score mean.
fn reconcile(proposals: Vec<Proposal>, now: DateTime<Utc>) -> Vec<MatchRecord> {
  let mut by_pair: HashMap<String, Vec<Proposal>> = HashMap::new();
  for p in proposals {
    let key = troth_core::record::pair_key(p.proposer, p.candidate);
    by_pair.entry(key).or_default().push(p);
  }

  let mut records = Vec::with_capacity(by_pair.len());
  for (key, mut pair) in by_pair {
    // Deterministic side assignment: the lower id becomes side 1.
    pair.sort_by_key(|p| p.proposer);
    let mut sides = pair.into_iter();
    match (sides.next(), sides.next(), sides.next()) {
      (Some(p), None, _) => {
        records.push(MatchRecord::new_one_way(
          Uuid::new_v4(),
          p.proposer,
          p.candidate,
          p.score,
          p.strategy,
          p.reason,
          now,
        ));
      }
      (Some(first), Some(second), None) => {
        records.push(MatchRecord::new_mutual(
          Uuid::new_v4(),
          (first.proposer, first.score, first.strategy, first.reason),
          (second.proposer, second.score, second.strategy, second.reason),
          now,
        ));
      }
      _ => {
        // Each user proposes a given candidate at most once, so a pair can
        // only collect one or two proposals.
        tracing::error!(pair_key = %key, "impossible proposal count");
      }
    }
  }
  records
}
