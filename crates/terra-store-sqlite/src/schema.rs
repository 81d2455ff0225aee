//! SQL schema for the territory store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS people (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name   TEXT NOT NULL,
    email  TEXT,
    phone  TEXT
);

CREATE TABLE IF NOT EXISTS territory_groups (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

-- `status` is a cache of \"has an open assignment\"; only the assignment
-- lifecycle writes it.
CREATE TABLE IF NOT EXISTS territories (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    number       TEXT NOT NULL,
    description  TEXT,
    image_url    TEXT,
    kind         TEXT,
    notes        TEXT,
    status       TEXT NOT NULL DEFAULT 'Disponível'
                 CHECK (status IN ('Disponível', 'Em campo')),
    group_id     INTEGER REFERENCES territory_groups(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS campaigns (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    start_date  TEXT NOT NULL,   -- YYYY-MM-DD
    end_date    TEXT NOT NULL    -- YYYY-MM-DD
);

-- Closed rows (return_date set) are never updated again.
CREATE TABLE IF NOT EXISTS assignments (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    territory_id   INTEGER NOT NULL REFERENCES territories(id) ON DELETE CASCADE,
    person_id      INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
    campaign_id    INTEGER REFERENCES campaigns(id) ON DELETE SET NULL,
    checkout_date  TEXT NOT NULL,   -- YYYY-MM-DD
    return_date    TEXT             -- YYYY-MM-DD; NULL while open
);

-- At most one open assignment per territory.
CREATE UNIQUE INDEX IF NOT EXISTS assignments_open_idx
    ON assignments(territory_id) WHERE return_date IS NULL;

CREATE INDEX IF NOT EXISTS assignments_territory_idx ON assignments(territory_id);
CREATE INDEX IF NOT EXISTS assignments_person_idx    ON assignments(person_id);
CREATE INDEX IF NOT EXISTS assignments_campaign_idx  ON assignments(campaign_id);
CREATE INDEX IF NOT EXISTS territories_group_idx     ON territories(group_id);

PRAGMA user_version = 1;
";
