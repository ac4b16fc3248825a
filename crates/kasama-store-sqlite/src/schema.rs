//! SQL schema for the Kasama SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id   TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

-- Permanent family members. Rows are created only by promotion from a
-- pending registration; identity fields are never updated afterwards.
CREATE TABLE IF NOT EXISTS family_members (
    member_id           TEXT PRIMARY KEY,
    account_id          TEXT NOT NULL REFERENCES accounts(account_id),
    registration_id     TEXT NOT NULL,
    first_name          TEXT NOT NULL,
    middle_initial      TEXT,
    last_name           TEXT NOT NULL,
    suffix              TEXT,
    first_key           TEXT NOT NULL,
    middle_key          TEXT NOT NULL DEFAULT '',
    last_key            TEXT NOT NULL,
    relationship        TEXT NOT NULL,   -- closed-set label, or 'other'
    relationship_detail TEXT,            -- free text when label = 'other'
    date_of_birth       TEXT NOT NULL,   -- ISO 8601 date
    approved_at         TEXT NOT NULL
);

-- The registration queue plus its decision history. Rows are never
-- deleted except by resident withdrawal while still pending.
CREATE TABLE IF NOT EXISTS registrations (
    registration_id     TEXT PRIMARY KEY,
    account_id          TEXT NOT NULL REFERENCES accounts(account_id),
    first_name          TEXT NOT NULL,
    middle_initial      TEXT,
    last_name           TEXT NOT NULL,
    suffix              TEXT,
    first_key           TEXT NOT NULL,
    middle_key          TEXT NOT NULL DEFAULT '',
    last_key            TEXT NOT NULL,
    relationship        TEXT NOT NULL,
    relationship_detail TEXT,
    date_of_birth       TEXT NOT NULL,
    photo               TEXT,
    status              TEXT NOT NULL DEFAULT 'pending',  -- 'pending' | 'approved' | 'rejected'
    submitted_at        TEXT NOT NULL,
    decided_at          TEXT,
    rejection_reason    TEXT
);

-- At most one active record per normalized identity, system-wide. These
-- back up the serialized check-then-insert in submit/approve.
CREATE UNIQUE INDEX IF NOT EXISTS members_identity_idx
    ON family_members(first_key, middle_key, last_key, date_of_birth);
CREATE UNIQUE INDEX IF NOT EXISTS registrations_pending_identity_idx
    ON registrations(first_key, middle_key, last_key, date_of_birth)
    WHERE status = 'pending';

CREATE INDEX IF NOT EXISTS members_account_idx       ON family_members(account_id);
CREATE INDEX IF NOT EXISTS members_key_idx           ON family_members(first_key, middle_key, last_key);
CREATE INDEX IF NOT EXISTS registrations_account_idx ON registrations(account_id);
CREATE INDEX IF NOT EXISTS registrations_key_idx     ON registrations(first_key, middle_key, last_key);

PRAGMA user_version = 1;
";
