//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use troth_core::{
  Error,
  record::{MatchAction, MatchRecord, Side},
  store::{MatchStore, UserDirectory},
  user::{Gender, RelationshipGoal, Seeking, Strategy, TraitScores, User},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn user() -> User {
  User {
    user_id: Uuid::new_v4(),
    gender: Gender::Female,
    seeking: Seeking::Everyone,
    goal: RelationshipGoal::Dating,
    city: Some("Lisbon".into()),
    age: 29,
    strategy: Strategy::Similarity,
    traits: Some(TraitScores {
      openness:          70.0,
      conscientiousness: 55.0,
      extraversion:      40.0,
      agreeableness:     80.0,
      neuroticism:       35.0,
    }),
    relationship_status: Some("single".into()),
    attachment_style: Some("secure".into()),
    communication_style: None,
    deal_breakers: vec!["smoking".into()],
    must_haves: vec![],
    is_active: true,
    is_analysis_complete: true,
  }
}

async fn seeded_pair(s: &SqliteStore) -> (User, User) {
  let a = user();
  let b = user();
  s.put_user(&a).await.unwrap();
  s.put_user(&b).await.unwrap();
  (a, b)
}

fn one_way(a: Uuid, b: Uuid) -> MatchRecord {
  MatchRecord::new_one_way(
    Uuid::new_v4(),
    a,
    b,
    61,
    Strategy::Similarity,
    "close match".into(),
    Utc::now(),
  )
}

fn mutual(a: Uuid, b: Uuid) -> MatchRecord {
  MatchRecord::new_mutual(
    Uuid::new_v4(),
    (a, 72, Strategy::Similarity, "close".into()),
    (b, 64, Strategy::Complementary, "balanced".into()),
    Utc::now(),
  )
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_user_and_roundtrip() {
  let s = store().await;
  let u = user();
  s.put_user(&u).await.unwrap();

  let fetched = s.user(u.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.user_id, u.user_id);
  assert_eq!(fetched.gender, Gender::Female);
  assert_eq!(fetched.city.as_deref(), Some("Lisbon"));
  assert_eq!(fetched.traits.unwrap().openness, 70.0);
  assert_eq!(fetched.deal_breakers, vec!["smoking".to_owned()]);
}

#[tokio::test]
async fn unknown_user_is_none() {
  let s = store().await;
  assert!(s.user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn active_analyzed_pool_filters_flags() {
  let s = store().await;
  let mut inactive = user();
  inactive.is_active = false;
  let mut unanalyzed = user();
  unanalyzed.is_analysis_complete = false;
  let eligible = user();

  s.put_user(&inactive).await.unwrap();
  s.put_user(&unanalyzed).await.unwrap();
  s.put_user(&eligible).await.unwrap();

  let pool = s.active_analyzed_users().await.unwrap();
  assert_eq!(pool.len(), 1);
  assert_eq!(pool[0].user_id, eligible.user_id);
}

// ─── Match records ───────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_fetch_match() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let record = mutual(a.user_id, b.user_id);

  s.insert_matches(vec![record.clone()]).await.unwrap();

  let fetched = s.match_record(record.match_id).await.unwrap().unwrap();
  assert_eq!(fetched.pair_key, record.pair_key);
  assert_eq!(fetched.score1, Some(72));
  assert_eq!(fetched.combined_score, Some(68));
  assert_eq!(fetched.version, 0);
}

#[tokio::test]
async fn duplicate_pair_key_fails_the_whole_batch() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let (c, d) = seeded_pair(&s).await;

  let first = mutual(a.user_id, b.user_id);
  s.insert_matches(vec![first]).await.unwrap();

  // Second batch: one fresh pair and one duplicate. Nothing may land.
  let fresh = mutual(c.user_id, d.user_id);
  let dup = one_way(a.user_id, b.user_id);
  let err = s.insert_matches(vec![fresh.clone(), dup]).await.unwrap_err();
  assert!(matches!(err, Error::Unavailable(_)));

  assert!(s.match_record(fresh.match_id).await.unwrap().is_none());
}

#[tokio::test]
async fn history_spans_both_sides_and_all_statuses() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let (c, _) = seeded_pair(&s).await;

  let mut closed = mutual(a.user_id, b.user_id);
  closed.remove(
    troth_core::record::DeletedReason::BothPassed,
    Utc::now(),
  );
  let open = one_way(c.user_id, a.user_id);

  s.insert_matches(vec![closed, open]).await.unwrap();

  let history = s.matches_for_user(a.user_id).await.unwrap();
  assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn visible_matches_respects_per_side_flags() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;

  // One-way: visible to side 1 only until interest is expressed.
  let record = one_way(a.user_id, b.user_id);
  s.insert_matches(vec![record]).await.unwrap();

  assert_eq!(s.visible_matches(a.user_id).await.unwrap().len(), 1);
  assert!(s.visible_matches(b.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn count_created_since_windows_on_timestamp() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let (c, _) = seeded_pair(&s).await;

  let mut old = mutual(a.user_id, b.user_id);
  old.created_at = Utc::now() - Duration::days(2);
  let new = mutual(a.user_id, c.user_id);
  s.insert_matches(vec![old, new]).await.unwrap();

  let midnight = Utc::now() - Duration::hours(12);
  assert_eq!(s.count_created_since(a.user_id, midnight).await.unwrap(), 1);
  assert_eq!(
    s.count_created_since(b.user_id, midnight).await.unwrap(),
    0
  );
}

// ─── Conditional update ──────────────────────────────────────────────────────

#[tokio::test]
async fn update_match_bumps_version() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let record = mutual(a.user_id, b.user_id);
  s.insert_matches(vec![record.clone()]).await.unwrap();

  let mut loaded = s.match_record(record.match_id).await.unwrap().unwrap();
  loaded.set_action(Side::User1, MatchAction::Like);
  loaded.touch(a.user_id, Utc::now());

  let stored = s.update_match(&loaded).await.unwrap();
  assert_eq!(stored.version, 1);

  let fetched = s.match_record(record.match_id).await.unwrap().unwrap();
  assert_eq!(fetched.version, 1);
  assert_eq!(fetched.action1, Some(MatchAction::Like));
  assert_eq!(fetched.total_interactions, 1);
  assert_eq!(fetched.last_action_by, Some(a.user_id));
}

#[tokio::test]
async fn stale_version_loses_the_race() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let record = mutual(a.user_id, b.user_id);
  s.insert_matches(vec![record.clone()]).await.unwrap();

  // Two actors load the same version.
  let mut first = s.match_record(record.match_id).await.unwrap().unwrap();
  let mut second = s.match_record(record.match_id).await.unwrap().unwrap();

  first.set_action(Side::User1, MatchAction::Like);
  first.touch(a.user_id, Utc::now());
  s.update_match(&first).await.unwrap();

  second.set_action(Side::User2, MatchAction::Like);
  second.touch(b.user_id, Utc::now());
  let err = s.update_match(&second).await.unwrap_err();
  assert!(matches!(err, Error::VersionConflict(_)));

  // Retry from fresh state succeeds.
  let mut fresh = s.match_record(record.match_id).await.unwrap().unwrap();
  fresh.set_action(Side::User2, MatchAction::Like);
  fresh.touch(b.user_id, Utc::now());
  let stored = s.update_match(&fresh).await.unwrap();
  assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn update_of_unknown_match_is_not_found() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let record = mutual(a.user_id, b.user_id);

  let err = s.update_match(&record).await.unwrap_err();
  assert!(matches!(err, Error::MatchNotFound(_)));
}

// ─── Notification bookkeeping ────────────────────────────────────────────────

#[tokio::test]
async fn pending_notifications_roundtrip() {
  let s = store().await;
  let (a, b) = seeded_pair(&s).await;
  let record = mutual(a.user_id, b.user_id);
  let match_id = record.match_id;
  s.insert_matches(vec![record]).await.unwrap();

  // Mutual creation leaves both sides pending.
  let pending = s.pending_notifications().await.unwrap();
  assert_eq!(pending.len(), 1);
  assert!(pending[0].notification_pending_user1);

  s.mark_notification_sent(match_id, Side::User1).await.unwrap();
  s.mark_notification_sent(match_id, Side::User2).await.unwrap();

  assert!(s.pending_notifications().await.unwrap().is_empty());
  let fetched = s.match_record(match_id).await.unwrap().unwrap();
  assert!(fetched.notification_sent_user1);
  assert!(fetched.notification_sent_user2);
  // Bookkeeping writes participate in the version sequence.
  assert_eq!(fetched.version, 2);
}
