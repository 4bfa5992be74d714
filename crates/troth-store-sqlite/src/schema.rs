//! SQL schema for the troth SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Users are owned by the external profile service; this table is a local
-- replica the matching pipeline reads. The analysis job fills traits_json.
CREATE TABLE IF NOT EXISTS users (
    user_id              TEXT PRIMARY KEY,
    gender               TEXT NOT NULL,    -- 'male' | 'female' | 'non_binary' | 'other'
    seeking              TEXT NOT NULL,    -- gender vocabulary plus 'everyone'
    goal                 TEXT NOT NULL,    -- 'friendship' | 'dating' | 'both'
    city                 TEXT,
    age                  INTEGER NOT NULL,
    strategy             TEXT NOT NULL,    -- scoring strategy discriminant
    traits_json          TEXT,             -- five 0-100 scores, NULL before analysis
    relationship_status  TEXT,
    attachment_style     TEXT,
    communication_style  TEXT,
    deal_breakers        TEXT NOT NULL DEFAULT '[]',
    must_haves           TEXT NOT NULL DEFAULT '[]',
    is_active            INTEGER NOT NULL DEFAULT 1,
    is_analysis_complete INTEGER NOT NULL DEFAULT 0
);

-- One row per unordered user pair, ever. Rows are created only by the batch
-- resolver and mutated only through the version-keyed conditional update.
CREATE TABLE IF NOT EXISTS matches (
    match_id                   TEXT PRIMARY KEY,
    pair_key                   TEXT NOT NULL UNIQUE,
    user1_id                   TEXT NOT NULL REFERENCES users(user_id),
    user2_id                   TEXT NOT NULL REFERENCES users(user_id),
    match_type                 TEXT NOT NULL,   -- 'one_way_interest' | 'mutual_algorithm'
    score1                     INTEGER,
    algorithm1                 TEXT,
    reason1                    TEXT,
    score2                     INTEGER,
    algorithm2                 TEXT,
    reason2                    TEXT,
    combined_score             INTEGER,
    action1                    TEXT,            -- 'like' | 'pass'
    action2                    TEXT,
    second_chance_offered1     INTEGER NOT NULL DEFAULT 0,
    second_chance_offered2     INTEGER NOT NULL DEFAULT 0,
    second_chance_response1    TEXT,            -- 'like' | 'still_pass'
    second_chance_response2    TEXT,
    user1_expressed_interest   INTEGER NOT NULL DEFAULT 0,
    user2_notified_of_interest INTEGER NOT NULL DEFAULT 0,
    match_status               TEXT NOT NULL DEFAULT 'pending',
    chat_unlocked              INTEGER NOT NULL DEFAULT 0,
    visible_to_user1           INTEGER NOT NULL DEFAULT 1,
    visible_to_user2           INTEGER NOT NULL DEFAULT 0,
    last_action_by             TEXT,
    last_action_at             TEXT,
    total_interactions         INTEGER NOT NULL DEFAULT 0,
    created_at                 TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    interest_expressed_at      TEXT,
    interest_responded_at      TEXT,
    love_at                    TEXT,
    deleted_at                 TEXT,
    deleted_reason             TEXT,
    notification_pending_user1 INTEGER NOT NULL DEFAULT 0,
    notification_pending_user2 INTEGER NOT NULL DEFAULT 0,
    notification_sent_user1    INTEGER NOT NULL DEFAULT 0,
    notification_sent_user2    INTEGER NOT NULL DEFAULT 0,
    version                    INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS matches_user1_idx   ON matches(user1_id);
CREATE INDEX IF NOT EXISTS matches_user2_idx   ON matches(user2_id);
CREATE INDEX IF NOT EXISTS matches_created_idx ON matches(created_at);

PRAGMA user_version = 1;
";
