//! SQL schema for the olympiad SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Catalog ─────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS areas (
    area_id    TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    fee_cents  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tutors (
    tutor_id   TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL UNIQUE,
    full_name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS competitors (
    competitor_id TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL UNIQUE,
    full_name     TEXT NOT NULL,
    birth_date    TEXT NOT NULL,   -- YYYY-MM-DD
    school        TEXT
);

-- status_code: 1 draft, 2 open, 3 in payment, 4 in competition, 5 closed
CREATE TABLE IF NOT EXISTS calls (
    call_id            TEXT PRIMARY KEY,
    name               TEXT NOT NULL,
    description        TEXT NOT NULL DEFAULT '',
    status_code        INTEGER NOT NULL CHECK (status_code BETWEEN 1 AND 5),
    registration_start TEXT NOT NULL,
    registration_end   TEXT NOT NULL,
    payment_start      TEXT NOT NULL,
    payment_end        TEXT NOT NULL,
    competition_start  TEXT NOT NULL,
    competition_end    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS call_areas (
    call_id TEXT NOT NULL REFERENCES calls(call_id),
    area_id TEXT NOT NULL REFERENCES areas(area_id),
    PRIMARY KEY (call_id, area_id)
);

CREATE TABLE IF NOT EXISTS rejection_reasons (
    reason_id INTEGER PRIMARY KEY,
    label     TEXT NOT NULL
);

INSERT OR IGNORE INTO rejection_reasons (reason_id, label) VALUES
    (1, 'Personal data is incorrect'),
    (2, 'Competitor is not my student'),
    (3, 'Wrong area for the competitor'),
    (4, 'Wrong category for the competitor''s grade'),
    (5, 'Missing or invalid documentation'),
    (6, 'Registration duplicated elsewhere'),
    (7, 'Other');

-- ── Enrollment workflow ─────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id     TEXT PRIMARY KEY,
    competitor_id     TEXT NOT NULL REFERENCES competitors(competitor_id),
    area_id           TEXT NOT NULL REFERENCES areas(area_id),
    call_id           TEXT NOT NULL REFERENCES calls(call_id),
    category_id       TEXT NOT NULL REFERENCES categories(category_id),
    created_at        TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    status            TEXT NOT NULL DEFAULT 'pending',
    status_changed_at TEXT,
    UNIQUE (competitor_id, call_id, area_id)
);

-- One row per (enrollment, tutor). Updated exactly once, never deleted.
CREATE TABLE IF NOT EXISTS tutor_decisions (
    link_id       TEXT PRIMARY KEY,
    enrollment_id TEXT NOT NULL REFERENCES enrollments(enrollment_id),
    tutor_id      TEXT NOT NULL REFERENCES tutors(tutor_id),
    decision      TEXT NOT NULL DEFAULT 'undecided'
                  CHECK (decision IN ('undecided', 'approved', 'rejected')),
    decided_at    TEXT,
    reason_id     INTEGER REFERENCES rejection_reasons(reason_id),
    elaboration   TEXT,
    UNIQUE (enrollment_id, tutor_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    kind            TEXT NOT NULL,
    message         TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS enrollments_cap_idx     ON enrollments(competitor_id, call_id);
CREATE INDEX IF NOT EXISTS decisions_tutor_idx     ON tutor_decisions(tutor_id);
CREATE INDEX IF NOT EXISTS notifications_user_idx  ON notifications(user_id);

PRAGMA user_version = 1;
";
