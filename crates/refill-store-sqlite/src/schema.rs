//! SQL schema for the refill SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS pharmacies (
    pharmacy_id   TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,  -- stored lowercased
    password_hash TEXT NOT NULL,         -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patients (
    patient_id  TEXT PRIMARY KEY,
    pharmacy_id TEXT NOT NULL REFERENCES pharmacies(pharmacy_id),
    name        TEXT NOT NULL,
    phone       TEXT NOT NULL,           -- normalised digit string
    chat_id     TEXT,                    -- NULL until chat linking completes
    created_at  TEXT NOT NULL,
    deleted_at  TEXT                     -- soft-delete marker
);

CREATE TABLE IF NOT EXISTS medicines (
    medicine_id    TEXT PRIMARY KEY,
    pharmacy_id    TEXT NOT NULL REFERENCES pharmacies(pharmacy_id),
    patient_id     TEXT NOT NULL REFERENCES patients(patient_id),
    medicine_name  TEXT NOT NULL,
    condition      TEXT NOT NULL,        -- 'BP' | 'Diabetes' | 'Thyroid' | 'Other'
    dosage_per_day REAL NOT NULL,
    tablets_given  INTEGER NOT NULL,
    start_date     TEXT NOT NULL,        -- ISO civil date
    refill_date    TEXT NOT NULL,        -- derived; never client-supplied
    status         TEXT NOT NULL DEFAULT 'active',  -- 'active' | 'missed' | 'stopped'
    last_reminder_sent_at          TEXT, -- 'today' dedup stamp
    last_upcoming_reminder_sent_at TEXT, -- 'upcoming' dedup stamp
    created_at     TEXT NOT NULL,
    deleted_at     TEXT
);

-- Refill logs are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS refill_logs (
    log_id        TEXT PRIMARY KEY,
    pharmacy_id   TEXT NOT NULL REFERENCES pharmacies(pharmacy_id),
    patient_id    TEXT NOT NULL REFERENCES patients(patient_id),
    medicine_id   TEXT NOT NULL REFERENCES medicines(medicine_id),
    refill_date   TEXT NOT NULL,
    tablets_given INTEGER NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    pharmacy_id     TEXT NOT NULL REFERENCES pharmacies(pharmacy_id),
    patient_id      TEXT NOT NULL REFERENCES patients(patient_id),
    medicine_id     TEXT NOT NULL REFERENCES medicines(medicine_id),
    kind            TEXT NOT NULL,       -- 'today' | 'upcoming' | 'missed'
    message         TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS patients_pharmacy_idx      ON patients(pharmacy_id);
CREATE INDEX IF NOT EXISTS medicines_pharmacy_idx     ON medicines(pharmacy_id);
CREATE INDEX IF NOT EXISTS medicines_patient_idx      ON medicines(patient_id);
CREATE INDEX IF NOT EXISTS medicines_due_idx          ON medicines(status, refill_date);
CREATE INDEX IF NOT EXISTS refill_logs_medicine_idx   ON refill_logs(medicine_id);
CREATE INDEX IF NOT EXISTS notifications_inbox_idx    ON notifications(pharmacy_id, is_read, created_at);
CREATE INDEX IF NOT EXISTS notifications_dedup_idx    ON notifications(medicine_id, kind);

PRAGMA user_version = 1;
";
