//! SQL schema for the civic SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The only table that is ever UPDATEd. All writes to a row happen inside an
-- IMMEDIATE transaction.
CREATE TABLE IF NOT EXISTS petitions (
    petition_id       TEXT PRIMARY KEY,
    title             TEXT NOT NULL,
    description       TEXT NOT NULL,
    category          TEXT NOT NULL,
    creator_id        TEXT NOT NULL,
    representative_id TEXT NOT NULL,
    status            TEXT NOT NULL,   -- PetitionStatus, SCREAMING_SNAKE_CASE
    signature_count   INTEGER NOT NULL DEFAULT 0 CHECK (signature_count >= 0),
    signature_goal    INTEGER NOT NULL CHECK (signature_goal >= 1),
    created_at        TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    updated_at        TEXT NOT NULL,
    sent_at           TEXT,
    delivered_at      TEXT,
    read_at           TEXT,
    responded_at      TEXT,
    closed_at         TEXT,
    title_folded      TEXT NOT NULL    -- lowercased title, for search
);

-- Append-only. One row per citizen per petition.
CREATE TABLE IF NOT EXISTS signatures (
    signature_id TEXT PRIMARY KEY,
    petition_id  TEXT NOT NULL REFERENCES petitions(petition_id) ON DELETE CASCADE,
    citizen_id   TEXT NOT NULL,
    comment      TEXT,
    anonymous    INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    UNIQUE (petition_id, citizen_id)
);

-- Append-only. `sequence` breaks ties between entries sharing created_at.
CREATE TABLE IF NOT EXISTS timeline (
    sequence     INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id     TEXT NOT NULL UNIQUE,
    petition_id  TEXT NOT NULL REFERENCES petitions(petition_id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,   -- TimelineEventKind, SCREAMING_SNAKE_CASE
    description  TEXT,
    created_at   TEXT NOT NULL
);

-- Append-only.
CREATE TABLE IF NOT EXISTS responses (
    response_id     TEXT PRIMARY KEY,
    petition_id     TEXT NOT NULL REFERENCES petitions(petition_id) ON DELETE CASCADE,
    responder_name  TEXT,
    responder_title TEXT,
    content         TEXT NOT NULL,
    official        INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS petitions_created_idx   ON petitions(created_at);
CREATE INDEX IF NOT EXISTS petitions_status_idx    ON petitions(status, updated_at);
CREATE INDEX IF NOT EXISTS signatures_petition_idx ON signatures(petition_id, created_at);
CREATE INDEX IF NOT EXISTS timeline_petition_idx   ON timeline(petition_id, created_at, sequence);
CREATE INDEX IF NOT EXISTS responses_petition_idx  ON responses(petition_id, created_at);

PRAGMA user_version = 1;
";
