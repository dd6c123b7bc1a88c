//! SQL schema for the demos SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS reservations (
    id             TEXT PRIMARY KEY,
    requester_kind TEXT NOT NULL,        -- 'nickname' | 'email'
    requester      TEXT NOT NULL,
    description    TEXT NOT NULL,
    date           TEXT NOT NULL,        -- YYYY-MM-DD
    time           TEXT NOT NULL,        -- HH:MM
    course         TEXT NOT NULL,
    slot_key       TEXT NOT NULL,        -- date || ' ' || time
    tags           TEXT NOT NULL DEFAULT '[]'
);

-- The authoritative double-booking guard.
CREATE UNIQUE INDEX IF NOT EXISTS reservations_slot_idx   ON reservations(slot_key);
CREATE        INDEX IF NOT EXISTS reservations_course_idx ON reservations(course);

CREATE TABLE IF NOT EXISTS problems (
    id             TEXT PRIMARY KEY,
    requester_kind TEXT NOT NULL,
    requester      TEXT NOT NULL,
    description    TEXT NOT NULL,
    course         TEXT NOT NULL,
    language       TEXT NOT NULL DEFAULT '',
    images         TEXT NOT NULL DEFAULT '[]',
    tags           TEXT NOT NULL DEFAULT '[]',
    created_at     TEXT NOT NULL         -- RFC 3339 UTC, fixed width; server-assigned
);

CREATE INDEX IF NOT EXISTS problems_created_idx ON problems(created_at);

CREATE TABLE IF NOT EXISTS accounts (
    id          TEXT PRIMARY KEY,
    identifier  TEXT NOT NULL UNIQUE,
    course      TEXT NOT NULL,
    secret_hash TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
