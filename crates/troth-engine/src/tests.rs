//! Scenario tests driving the lifecycle engine and the batch resolver
//! against a real in-memory SQLite store.

use std::{
  future::Future,
  sync::{Arc, Mutex},
  time::Duration,
};

use chrono::Utc;
use troth_core::{
  Error, ErrorKind,
  notify::{Fanout, MatchEvent, MatchEventKind},
  record::{DeletedReason, MatchRecord, MatchStatus, MatchType, Side},
  store::MatchStore,
  user::{Gender, RelationshipGoal, Seeking, Strategy, TraitScores, User},
};
use troth_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  BatchResolver, MatchService, NotificationEmitter, ResolverConfig,
};

// ─── Fakes and fixtures ──────────────────────────────────────────────────────

/// Records every delivery and retraction; never fails.
#[derive(Default)]
struct RecordingFanout {
  events:      Mutex<Vec<(Uuid, MatchEventKind)>>,
  retractions: Mutex<Vec<(Uuid, Uuid)>>,
}

impl RecordingFanout {
  fn event_count(&self) -> usize { self.events.lock().unwrap().len() }

  fn kinds(&self) -> Vec<MatchEventKind> {
    self.events.lock().unwrap().iter().map(|(_, k)| *k).collect()
  }
}

impl Fanout for RecordingFanout {
  type Error = std::convert::Infallible;

  fn deliver<'a>(
    &'a self,
    user_id: Uuid,
    event: &'a MatchEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    async move {
      self.events.lock().unwrap().push((user_id, event.kind));
      Ok(())
    }
  }

  fn retract(
    &self,
    user_id: Uuid,
    match_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    async move {
      self.retractions.lock().unwrap().push((user_id, match_id));
      Ok(())
    }
  }
}

fn flat(value: f64) -> TraitScores {
  TraitScores {
    openness:          value,
    conscientiousness: value,
    extraversion:      value,
    agreeableness:     value,
    neuroticism:       value,
  }
}

fn user_with(
  gender:   Gender,
  seeking:  Seeking,
  strategy: Strategy,
  traits:   Option<TraitScores>,
) -> User {
  User {
    user_id: Uuid::new_v4(),
    gender,
    seeking,
    goal: RelationshipGoal::Dating,
    city: None,
    age: 30,
    strategy,
    traits,
    relationship_status: None,
    attachment_style: None,
    communication_style: None,
    deal_breakers: vec![],
    must_haves: vec![],
    is_active: true,
    is_analysis_complete: true,
  }
}

struct Harness {
  store:   Arc<SqliteStore>,
  fanout:  Arc<RecordingFanout>,
  service: MatchService<SqliteStore, RecordingFanout>,
}

async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let fanout = Arc::new(RecordingFanout::default());
  let emitter =
    NotificationEmitter::new(Arc::clone(&fanout), Duration::from_millis(0));
  let service = MatchService::new(Arc::clone(&store), emitter);
  Harness { store, fanout, service }
}

impl Harness {
  async fn seed_user(&self) -> User {
    let u = user_with(
      Gender::Female,
      Seeking::Everyone,
      Strategy::Similarity,
      Some(flat(50.0)),
    );
    self.store.put_user(&u).await.unwrap();
    u
  }

  async fn seed_one_way(&self) -> (MatchRecord, Uuid, Uuid) {
    let a = self.seed_user().await;
    let b = self.seed_user().await;
    let record = MatchRecord::new_one_way(
      Uuid::new_v4(),
      a.user_id,
      b.user_id,
      60,
      Strategy::Similarity,
      "close".into(),
      Utc::now(),
    );
    self.store.insert_matches(vec![record.clone()]).await.unwrap();
    (record, a.user_id, b.user_id)
  }

  async fn seed_mutual(&self) -> (MatchRecord, Uuid, Uuid) {
    let a = self.seed_user().await;
    let b = self.seed_user().await;
    let record = MatchRecord::new_mutual(
      Uuid::new_v4(),
      (a.user_id, 70, Strategy::Similarity, "a".into()),
      (b.user_id, 80, Strategy::Similarity, "b".into()),
      Utc::now(),
    );
    self.store.insert_matches(vec![record.clone()]).await.unwrap();
    (record, a.user_id, b.user_id)
  }
}

// ─── One-way lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn one_way_express_then_accept_unlocks_love() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_one_way().await;

  let updated = h.service.express_interest(record.match_id, side1).await.unwrap();
  assert!(updated.user1_expressed_interest);
  assert!(updated.visible_to_user2);
  assert_eq!(updated.version, 1);

  let outcome = h.service.accept_interest(record.match_id, side2).await.unwrap();
  assert!(outcome.is_love_match);
  assert!(outcome.record.chat_unlocked);
  assert_eq!(outcome.record.match_status, MatchStatus::Love);

  assert_eq!(
    h.fanout.kinds(),
    vec![
      MatchEventKind::StatusChange,
      MatchEventKind::StatusChange,
      MatchEventKind::LoveMatch,
      MatchEventKind::LoveMatch,
    ]
  );
}

#[tokio::test]
async fn accept_before_interest_is_a_conflict() {
  let h = harness().await;
  let (record, _, side2) = h.seed_one_way().await;

  let err = h.service.accept_interest(record.match_id, side2).await.unwrap_err();
  assert!(matches!(err, Error::NoInterestToAccept(_)));
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn one_way_pass_stays_invisible_to_side2_forever() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_one_way().await;

  let outcome = h.service.pass(record.match_id, side1, false).await.unwrap();
  assert!(outcome.is_deleted);
  assert_eq!(
    outcome.record.deleted_reason,
    Some(DeletedReason::NoInterest)
  );

  // Side 2 never saw it and still cannot.
  let err = h.service.match_details(record.match_id, side2).await.unwrap_err();
  assert!(matches!(err, Error::MatchNotFound(_)));
  assert!(h.service.visible_matches(side2).await.unwrap().is_empty());
}

// ─── Mutual lifecycle ────────────────────────────────────────────────────────

#[tokio::test]
async fn mutual_both_like_is_a_love_match() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_mutual().await;

  let first = h.service.like(record.match_id, side1, false).await.unwrap();
  assert!(!first.is_love_match);
  assert_eq!(first.record.match_status, MatchStatus::Pending);

  let second = h.service.like(record.match_id, side2, false).await.unwrap();
  assert!(second.is_love_match);
  assert!(second.record.chat_unlocked);
}

#[tokio::test]
async fn pass_after_like_offers_second_chance_and_stays_pending() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_mutual().await;

  h.service.like(record.match_id, side1, false).await.unwrap();
  let outcome = h.service.pass(record.match_id, side2, false).await.unwrap();

  assert!(!outcome.is_deleted);
  assert!(outcome.second_chance_offered);

  let details = h.service.match_details(record.match_id, side2).await.unwrap();
  assert_eq!(details.side, Side::User2);
  assert!(details.record.second_chance_offered2);
  assert_eq!(details.record.match_status, MatchStatus::Pending);
}

#[tokio::test]
async fn second_chance_still_pass_removes_the_match() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_mutual().await;

  h.service.like(record.match_id, side1, false).await.unwrap();
  h.service.pass(record.match_id, side2, false).await.unwrap();

  let outcome = h.service.pass(record.match_id, side2, true).await.unwrap();
  assert!(outcome.is_deleted);
  assert_eq!(
    outcome.record.deleted_reason,
    Some(DeletedReason::SecondChanceRejected)
  );

  // Hidden from both sides now.
  for user in [side1, side2] {
    let err = h.service.match_details(record.match_id, user).await.unwrap_err();
    assert!(matches!(err, Error::MatchNotFound(_)));
  }
}

#[tokio::test]
async fn second_chance_like_always_unlocks_love() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_mutual().await;

  h.service.pass(record.match_id, side1, false).await.unwrap();
  // side2's like hands side1 the second chance.
  let liked = h.service.like(record.match_id, side2, false).await.unwrap();
  assert!(liked.second_chance_offered);

  let outcome = h.service.like(record.match_id, side1, true).await.unwrap();
  assert!(outcome.is_love_match);
  assert!(outcome.record.chat_unlocked);
}

#[tokio::test]
async fn match_removed_retracts_fanout_entries_after_grace() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_mutual().await;

  h.service.pass(record.match_id, side1, false).await.unwrap();
  h.service.pass(record.match_id, side2, false).await.unwrap();

  // Grace is zero in tests; give the spawned task a beat to run.
  tokio::time::sleep(Duration::from_millis(50)).await;
  let retractions = h.fanout.retractions.lock().unwrap().clone();
  assert_eq!(retractions.len(), 2);
  assert!(retractions.iter().all(|(_, m)| *m == record.match_id));
}

#[tokio::test]
async fn repeated_pass_is_idempotent_and_silent() {
  let h = harness().await;
  let (record, side1, side2) = h.seed_mutual().await;

  h.service.like(record.match_id, side1, false).await.unwrap();
  h.service.pass(record.match_id, side2, false).await.unwrap();
  let events_before = h.fanout.event_count();
  let details = h.service.match_details(record.match_id, side2).await.unwrap();
  let interactions = details.record.total_interactions;

  let again = h.service.pass(record.match_id, side2, false).await.unwrap();
  assert!(!again.second_chance_offered);
  assert_eq!(again.record.total_interactions, interactions);
  assert_eq!(h.fanout.event_count(), events_before);
}

#[tokio::test]
async fn stranger_cannot_read_or_act() {
  let h = harness().await;
  let (record, _, _) = h.seed_mutual().await;
  let stranger = Uuid::new_v4();

  let err = h.service.match_details(record.match_id, stranger).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);

  let err = h.service.like(record.match_id, stranger, false).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn unknown_match_is_not_found() {
  let h = harness().await;
  let user = h.seed_user().await;

  let err = h
    .service
    .like(Uuid::new_v4(), user.user_id, false)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Batch resolver ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sweep_creates_mutual_and_one_way_records() {
  let h = harness().await;

  // A and B only accept each other; similar traits make both directions
  // score well above the threshold.
  let a = user_with(
    Gender::Female,
    Seeking::Male,
    Strategy::Similarity,
    Some(flat(50.0)),
  );
  let b = user_with(
    Gender::Male,
    Seeking::Female,
    Strategy::Similarity,
    Some(flat(55.0)),
  );
  // C proposes D through the deal-breaker base of 70; D's similarity
  // scoring of C lands at zero, so the reverse proposal never happens.
  let c = user_with(
    Gender::NonBinary,
    Seeking::NonBinary,
    Strategy::DealBreaker,
    Some(flat(90.0)),
  );
  let d = user_with(
    Gender::NonBinary,
    Seeking::NonBinary,
    Strategy::Similarity,
    Some(flat(10.0)),
  );
  for u in [&a, &b, &c, &d] {
    h.store.put_user(u).await.unwrap();
  }

  let resolver =
    BatchResolver::new(Arc::clone(&h.store), ResolverConfig::default());
  let summary = resolver.run().await.unwrap();

  assert_eq!(summary.users_processed, 4);
  assert_eq!(summary.records_created, 2);
  assert_eq!(summary.mutual_matches, 1);
  assert_eq!(summary.one_way_matches, 1);

  let a_matches = h.store.matches_for_user(a.user_id).await.unwrap();
  assert_eq!(a_matches.len(), 1);
  assert_eq!(a_matches[0].match_type, MatchType::MutualAlgorithm);
  assert!(a_matches[0].visible_to_user1);
  assert!(a_matches[0].visible_to_user2);
  assert!(a_matches[0].combined_score.is_some());

  let c_matches = h.store.matches_for_user(c.user_id).await.unwrap();
  assert_eq!(c_matches.len(), 1);
  assert_eq!(c_matches[0].match_type, MatchType::OneWayInterest);
  assert_eq!(c_matches[0].user1_id, c.user_id);
  assert!(!c_matches[0].visible_to_user2);
}

#[tokio::test]
async fn sweep_never_reproposes_a_known_pair() {
  let h = harness().await;

  let a = user_with(
    Gender::Female,
    Seeking::Male,
    Strategy::Similarity,
    Some(flat(50.0)),
  );
  let b = user_with(
    Gender::Male,
    Seeking::Female,
    Strategy::Similarity,
    Some(flat(50.0)),
  );
  h.store.put_user(&a).await.unwrap();
  h.store.put_user(&b).await.unwrap();

  let resolver =
    BatchResolver::new(Arc::clone(&h.store), ResolverConfig::default());
  let first = resolver.run().await.unwrap();
  assert_eq!(first.records_created, 1);

  // The pair is now history — even a rejected record would keep it out.
  let second = resolver.run().await.unwrap();
  assert_eq!(second.records_created, 0);
}

#[tokio::test]
async fn sweep_skips_users_whose_daily_budget_is_spent() {
  let h = harness().await;

  let e = user_with(
    Gender::Female,
    Seeking::Everyone,
    Strategy::Similarity,
    Some(flat(50.0)),
  );
  let f = user_with(
    Gender::Male,
    Seeking::Everyone,
    Strategy::Similarity,
    Some(flat(50.0)),
  );
  h.store.put_user(&e).await.unwrap();
  h.store.put_user(&f).await.unwrap();

  // Exhaust e's budget with existing records created today. The filler
  // counterparties are inactive so they stay out of the sweep pool.
  let mut fillers = Vec::new();
  for _ in 0..5 {
    let mut other = user_with(
      Gender::Other,
      Seeking::Everyone,
      Strategy::Similarity,
      None,
    );
    other.is_active = false;
    h.store.put_user(&other).await.unwrap();
    fillers.push(MatchRecord::new_one_way(
      Uuid::new_v4(),
      e.user_id,
      other.user_id,
      50,
      Strategy::Similarity,
      "filler".into(),
      Utc::now(),
    ));
  }
  h.store.insert_matches(fillers).await.unwrap();

  let resolver =
    BatchResolver::new(Arc::clone(&h.store), ResolverConfig::default());
  let summary = resolver.run().await.unwrap();

  // e proposes nothing, but can still be proposed: f's proposal of e
  // becomes a one-way record with f as side 1.
  assert!(summary.users_skipped >= 1);
  let f_matches = h.store.matches_for_user(f.user_id).await.unwrap();
  assert_eq!(f_matches.len(), 1);
  assert_eq!(f_matches[0].match_type, MatchType::OneWayInterest);
  assert_eq!(f_matches[0].user1_id, f.user_id);
}

#[tokio::test]
async fn incompatible_seekers_are_never_paired() {
  let h = harness().await;

  // Identical traits would score perfectly, but the preferences can never
  // agree: a seeks men only, b is a woman seeking men.
  let a = user_with(
    Gender::Male,
    Seeking::Male,
    Strategy::Similarity,
    Some(flat(50.0)),
  );
  let b = user_with(
    Gender::Female,
    Seeking::Male,
    Strategy::Similarity,
    Some(flat(50.0)),
  );
  h.store.put_user(&a).await.unwrap();
  h.store.put_user(&b).await.unwrap();

  let resolver =
    BatchResolver::new(Arc::clone(&h.store), ResolverConfig::default());
  let summary = resolver.run().await.unwrap();
  assert_eq!(summary.records_created, 0);
}
