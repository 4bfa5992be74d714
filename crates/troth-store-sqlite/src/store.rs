//! [`SqliteStore`] — the SQLite implementation of the store traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use troth_core::{
  Error, Result,
  record::{MatchRecord, Side},
  store::{MatchStore, UserDirectory},
  user::User,
};
use uuid::Uuid;

use crate::{
  encode::{
    RawMatch, RawUser, encode_action, encode_deleted_reason, encode_dt,
    encode_gender, encode_goal, encode_match_type, encode_sc_response,
    encode_seeking, encode_status, encode_strategy, encode_string_list,
    encode_traits, encode_uuid,
  },
  schema::SCHEMA,
};

fn db_err(e: tokio_rusqlite::Error) -> Error { Error::Unavailable(e.to_string()) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A troth store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await.map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  /// Insert or replace a user row. The pool is owned by the external
  /// profile service; this is the ingestion point for its replica.
  pub async fn put_user(&self, user: &User) -> Result<()> {
    let user_id = encode_uuid(user.user_id);
    let gender = encode_gender(user.gender).to_owned();
    let seeking = encode_seeking(user.seeking).to_owned();
    let goal = encode_goal(user.goal).to_owned();
    let city = user.city.clone();
    let age = i64::from(user.age);
    let strategy = encode_strategy(user.strategy).to_owned();
    let traits_json = encode_traits(&user.traits)?;
    let relationship_status = user.relationship_status.clone();
    let attachment_style = user.attachment_style.clone();
    let communication_style = user.communication_style.clone();
    let deal_breakers = encode_string_list(&user.deal_breakers)?;
    let must_haves = encode_string_list(&user.must_haves)?;
    let is_active = user.is_active;
    let is_analysis_complete = user.is_analysis_complete;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO users (
             user_id, gender, seeking, goal, city, age, strategy,
             traits_json, relationship_status, attachment_style,
             communication_style, deal_breakers, must_haves,
             is_active, is_analysis_complete
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
          rusqlite::params![
            user_id,
            gender,
            seeking,
            goal,
            city,
            age,
            strategy,
            traits_json,
            relationship_status,
            attachment_style,
            communication_style,
            deal_breakers,
            must_haves,
            is_active,
            is_analysis_complete,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

const USER_COLUMNS: &str = "user_id, gender, seeking, goal, city, age, strategy, \
  traits_json, relationship_status, attachment_style, communication_style, \
  deal_breakers, must_haves, is_active, is_analysis_complete";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:              row.get(0)?,
    gender:               row.get(1)?,
    seeking:              row.get(2)?,
    goal:                 row.get(3)?,
    city:                 row.get(4)?,
    age:                  row.get(5)?,
    strategy:             row.get(6)?,
    traits_json:          row.get(7)?,
    relationship_status:  row.get(8)?,
    attachment_style:     row.get(9)?,
    communication_style:  row.get(10)?,
    deal_breakers:        row.get(11)?,
    must_haves:           row.get(12)?,
    is_active:            row.get(13)?,
    is_analysis_complete: row.get(14)?,
  })
}

const MATCH_COLUMNS: &str = "match_id, pair_key, user1_id, user2_id, match_type, \
  score1, algorithm1, reason1, score2, algorithm2, reason2, combined_score, \
  action1, action2, second_chance_offered1, second_chance_offered2, \
  second_chance_response1, second_chance_response2, user1_expressed_interest, \
  user2_notified_of_interest, match_status, chat_unlocked, visible_to_user1, \
  visible_to_user2, last_action_by, last_action_at, total_interactions, \
  created_at, interest_expressed_at, interest_responded_at, love_at, \
  deleted_at, deleted_reason, notification_pending_user1, \
  notification_pending_user2, notification_sent_user1, notification_sent_user2, \
  version";

fn match_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMatch> {
  Ok(RawMatch {
    match_id:                   row.get(0)?,
    pair_key:                   row.get(1)?,
    user1_id:                   row.get(2)?,
    user2_id:                   row.get(3)?,
    match_type:                 row.get(4)?,
    score1:                     row.get(5)?,
    algorithm1:                 row.get(6)?,
    reason1:                    row.get(7)?,
    score2:                     row.get(8)?,
    algorithm2:                 row.get(9)?,
    reason2:                    row.get(10)?,
    combined_score:             row.get(11)?,
    action1:                    row.get(12)?,
    action2:                    row.get(13)?,
    second_chance_offered1:     row.get(14)?,
    second_chance_offered2:     row.get(15)?,
    second_chance_response1:    row.get(16)?,
    second_chance_response2:    row.get(17)?,
    user1_expressed_interest:   row.get(18)?,
    user2_notified_of_interest: row.get(19)?,
    match_status:               row.get(20)?,
    chat_unlocked:              row.get(21)?,
    visible_to_user1:           row.get(22)?,
    visible_to_user2:           row.get(23)?,
    last_action_by:             row.get(24)?,
    last_action_at:             row.get(25)?,
    total_interactions:         row.get(26)?,
    created_at:                 row.get(27)?,
    interest_expressed_at:      row.get(28)?,
    interest_responded_at:      row.get(29)?,
    love_at:                    row.get(30)?,
    deleted_at:                 row.get(31)?,
    deleted_reason:             row.get(32)?,
    notification_pending_user1: row.get(33)?,
    notification_pending_user2: row.get(34)?,
    notification_sent_user1:    row.get(35)?,
    notification_sent_user2:    row.get(36)?,
    version:                    row.get(37)?,
  })
}

/// Marshal a record into the owned column values an INSERT or UPDATE needs.
fn to_raw(record: &MatchRecord) -> RawMatch {
  RawMatch {
    match_id:                   encode_uuid(record.match_id),
    pair_key:                   record.pair_key.clone(),
    user1_id:                   encode_uuid(record.user1_id),
    user2_id:                   encode_uuid(record.user2_id),
    match_type:                 encode_match_type(record.match_type).to_owned(),
    score1:                     record.score1.map(i64::from),
    algorithm1:                 record.algorithm1.map(|s| encode_strategy(s).to_owned()),
    reason1:                    record.reason1.clone(),
    score2:                     record.score2.map(i64::from),
    algorithm2:                 record.algorithm2.map(|s| encode_strategy(s).to_owned()),
    reason2:                    record.reason2.clone(),
    combined_score:             record.combined_score.map(i64::from),
    action1:                    record.action1.map(|a| encode_action(a).to_owned()),
    action2:                    record.action2.map(|a| encode_action(a).to_owned()),
    second_chance_offered1:     record.second_chance_offered1,
    second_chance_offered2:     record.second_chance_offered2,
    second_chance_response1:    record
      .second_chance_response1
      .map(|r| encode_sc_response(r).to_owned()),
    second_chance_response2:    record
      .second_chance_response2
      .map(|r| encode_sc_response(r).to_owned()),
    user1_expressed_interest:   record.user1_expressed_interest,
    user2_notified_of_interest: record.user2_notified_of_interest,
    match_status:               encode_status(record.match_status).to_owned(),
    chat_unlocked:              record.chat_unlocked,
    visible_to_user1:           record.visible_to_user1,
    visible_to_user2:           record.visible_to_user2,
    last_action_by:             record.last_action_by.map(encode_uuid),
    last_action_at:             record.last_action_at.map(encode_dt),
    total_interactions:         record.total_interactions,
    created_at:                 encode_dt(record.created_at),
    interest_expressed_at:      record.interest_expressed_at.map(encode_dt),
    interest_responded_at:      record.interest_responded_at.map(encode_dt),
    love_at:                    record.love_at.map(encode_dt),
    deleted_at:                 record.deleted_at.map(encode_dt),
    deleted_reason:             record
      .deleted_reason
      .map(|r| encode_deleted_reason(r).to_owned()),
    notification_pending_user1: record.notification_pending_user1,
    notification_pending_user2: record.notification_pending_user2,
    notification_sent_user1:    record.notification_sent_user1,
    notification_sent_user2:    record.notification_sent_user2,
    version:                    record.version,
  }
}

// ─── UserDirectory impl ──────────────────────────────────────────────────────

impl UserDirectory for SqliteStore {
  async fn active_analyzed_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {USER_COLUMNS} FROM users
           WHERE is_active = 1 AND is_analysis_complete = 1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| user_from_row(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], |row| user_from_row(row))
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawUser::into_user).transpose()
  }
}

// ─── MatchStore impl ─────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  async fn match_record(&self, match_id: Uuid) -> Result<Option<MatchRecord>> {
    let id_str = encode_uuid(match_id);

    let raw: Option<RawMatch> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE match_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], |row| match_from_row(row))
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawMatch::into_record).transpose()
  }

  async fn matches_for_user(&self, user_id: Uuid) -> Result<Vec<MatchRecord>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MATCH_COLUMNS} FROM matches
           WHERE user1_id = ?1 OR user2_id = ?1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| match_from_row(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawMatch::into_record).collect()
  }

  async fn visible_matches(&self, user_id: Uuid) -> Result<Vec<MatchRecord>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MATCH_COLUMNS} FROM matches
           WHERE (user1_id = ?1 AND visible_to_user1 = 1)
              OR (user2_id = ?1 AND visible_to_user2 = 1)
           ORDER BY created_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| match_from_row(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawMatch::into_record).collect()
  }

  async fn count_created_since(
    &self,
    user_id: Uuid,
    since: DateTime<Utc>,
  ) -> Result<u64> {
    let id_str = encode_uuid(user_id);
    let since_str = encode_dt(since);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM matches
           WHERE (user1_id = ?1 OR user2_id = ?1) AND created_at >= ?2",
          rusqlite::params![id_str, since_str],
          |row| row.get(0),
        )?)
      })
      .await
      .map_err(db_err)?;

    Ok(count as u64)
  }

  async fn insert_matches(&self, records: Vec<MatchRecord>) -> Result<()> {
    let raws: Vec<RawMatch> = records.iter().map(to_raw).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO matches (
               match_id, pair_key, user1_id, user2_id, match_type,
               score1, algorithm1, reason1, score2, algorithm2, reason2,
               combined_score, action1, action2,
               second_chance_offered1, second_chance_offered2,
               second_chance_response1, second_chance_response2,
               user1_expressed_interest, user2_notified_of_interest,
               match_status, chat_unlocked, visible_to_user1, visible_to_user2,
               last_action_by, last_action_at, total_interactions, created_at,
               interest_expressed_at, interest_responded_at, love_at,
               deleted_at, deleted_reason,
               notification_pending_user1, notification_pending_user2,
               notification_sent_user1, notification_sent_user2, version
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                       ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32,
                       ?33, ?34, ?35, ?36, ?37, ?38)",
          )?;
          for raw in &raws {
            stmt.execute(rusqlite::params![
              raw.match_id,
              raw.pair_key,
              raw.user1_id,
              raw.user2_id,
              raw.match_type,
              raw.score1,
              raw.algorithm1,
              raw.reason1,
              raw.score2,
              raw.algorithm2,
              raw.reason2,
              raw.combined_score,
              raw.action1,
              raw.action2,
              raw.second_chance_offered1,
              raw.second_chance_offered2,
              raw.second_chance_response1,
              raw.second_chance_response2,
              raw.user1_expressed_interest,
              raw.user2_notified_of_interest,
              raw.match_status,
              raw.chat_unlocked,
              raw.visible_to_user1,
              raw.visible_to_user2,
              raw.last_action_by,
              raw.last_action_at,
              raw.total_interactions,
              raw.created_at,
              raw.interest_expressed_at,
              raw.interest_responded_at,
              raw.love_at,
              raw.deleted_at,
              raw.deleted_reason,
              raw.notification_pending_user1,
              raw.notification_pending_user2,
              raw.notification_sent_user1,
              raw.notification_sent_user2,
              raw.version,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }

  async fn update_match(&self, record: &MatchRecord) -> Result<MatchRecord> {
    let raw = to_raw(record);
    let expected_version = record.version;

    let (changed, exists): (usize, bool) = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE matches SET
             action1 = ?1, action2 = ?2,
             second_chance_offered1 = ?3, second_chance_offered2 = ?4,
             second_chance_response1 = ?5, second_chance_response2 = ?6,
             user1_expressed_interest = ?7, user2_notified_of_interest = ?8,
             match_status = ?9, chat_unlocked = ?10,
             visible_to_user1 = ?11, visible_to_user2 = ?12,
             last_action_by = ?13, last_action_at = ?14,
             total_interactions = ?15,
             interest_expressed_at = ?16, interest_responded_at = ?17,
             love_at = ?18, deleted_at = ?19, deleted_reason = ?20,
             notification_pending_user1 = ?21, notification_pending_user2 = ?22,
             notification_sent_user1 = ?23, notification_sent_user2 = ?24,
             version = version + 1
           WHERE match_id = ?25 AND version = ?26",
          rusqlite::params![
            raw.action1,
            raw.action2,
            raw.second_chance_offered1,
            raw.second_chance_offered2,
            raw.second_chance_response1,
            raw.second_chance_response2,
            raw.user1_expressed_interest,
            raw.user2_notified_of_interest,
            raw.match_status,
            raw.chat_unlocked,
            raw.visible_to_user1,
            raw.visible_to_user2,
            raw.last_action_by,
            raw.last_action_at,
            raw.total_interactions,
            raw.interest_expressed_at,
            raw.interest_responded_at,
            raw.love_at,
            raw.deleted_at,
            raw.deleted_reason,
            raw.notification_pending_user1,
            raw.notification_pending_user2,
            raw.notification_sent_user1,
            raw.notification_sent_user2,
            raw.match_id,
            expected_version,
          ],
        )?;

        let exists = if changed == 0 {
          conn
            .query_row(
              "SELECT 1 FROM matches WHERE match_id = ?1",
              rusqlite::params![raw.match_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false)
        } else {
          true
        };

        Ok((changed, exists))
      })
      .await
      .map_err(db_err)?;

    match (changed, exists) {
      (0, false) => Err(Error::MatchNotFound(record.match_id)),
      (0, true) => Err(Error::VersionConflict(record.match_id)),
      _ => {
        let mut stored = record.clone();
        stored.version += 1;
        Ok(stored)
      }
    }
  }

  async fn pending_notifications(&self) -> Result<Vec<MatchRecord>> {
    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MATCH_COLUMNS} FROM matches
           WHERE notification_pending_user1 = 1 OR notification_pending_user2 = 1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| match_from_row(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawMatch::into_record).collect()
  }

  async fn mark_notification_sent(&self, match_id: Uuid, side: Side) -> Result<()> {
    let id_str = encode_uuid(match_id);
    let sql = match side {
      Side::User1 => {
        "UPDATE matches SET notification_pending_user1 = 0,
           notification_sent_user1 = 1, version = version + 1
         WHERE match_id = ?1"
      }
      Side::User2 => {
        "UPDATE matches SET notification_pending_user2 = 0,
           notification_sent_user2 = 1, version = version + 1
         WHERE match_id = ?1"
      }
    };

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params![id_str])?))
      .await
      .map_err(db_err)?;

    if changed == 0 {
      return Err(Error::MatchNotFound(match_id));
    }
    Ok(())
  }
}
