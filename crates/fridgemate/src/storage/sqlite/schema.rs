//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Per-kind id allocation; ids only ever grow
CREATE TABLE IF NOT EXISTS sequences (
    kind TEXT PRIMARY KEY,
    last_id INTEGER NOT NULL
);

-- Record snapshots as JSON
CREATE TABLE IF NOT EXISTS records (
    kind TEXT NOT NULL,
    id INTEGER NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (kind, id)
);

-- Indexed fields of every record
CREATE TABLE IF NOT EXISTS record_keys (
    kind TEXT NOT NULL,
    field TEXT NOT NULL,
    value TEXT NOT NULL,
    id INTEGER NOT NULL,
    is_unique INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_record_keys_unique
    ON record_keys(kind, field, value) WHERE is_unique = 1;
CREATE INDEX IF NOT EXISTS idx_record_keys_lookup ON record_keys(kind, field, value);
CREATE INDEX IF NOT EXISTS idx_record_keys_record ON record_keys(kind, id);
"#;

// ============================================================================
// Sequence queries
// ============================================================================

pub const NEXT_ID: &str = r#"
INSERT INTO sequences (kind, last_id) VALUES (?1, 1)
ON CONFLICT(kind) DO UPDATE SET last_id = last_id + 1
"#;

pub const SELECT_LAST_ID: &str = "SELECT last_id FROM sequences WHERE kind = ?1";

// ============================================================================
// Record queries
// ============================================================================

pub const SELECT_RECORD_BY_ID: &str = "SELECT body FROM records WHERE kind = ?1 AND id = ?2";

pub const SELECT_RECORD_EXISTS: &str =
    "SELECT EXISTS(SELECT 1 FROM records WHERE kind = ?1 AND id = ?2)";

pub const SELECT_ALL_RECORDS: &str = "SELECT body FROM records WHERE kind = ?1 ORDER BY id";

pub const SELECT_RECORD_BY_UNIQUE_KEY: &str = r#"
SELECT r.body
FROM records r
JOIN record_keys k ON k.kind = r.kind AND k.id = r.id
WHERE k.kind = ?1 AND k.field = ?2 AND k.value = ?3 AND k.is_unique = 1
"#;

pub const SELECT_RECORDS_BY_KEY: &str = r#"
SELECT r.body
FROM records r
JOIN record_keys k ON k.kind = r.kind AND k.id = r.id
WHERE k.kind = ?1 AND k.field = ?2 AND k.value = ?3
ORDER BY r.id
"#;

pub const INSERT_RECORD: &str = "INSERT INTO records (kind, id, body) VALUES (?1, ?2, ?3)";

pub const UPDATE_RECORD: &str = "UPDATE records SET body = ?3 WHERE kind = ?1 AND id = ?2";

pub const DELETE_RECORD: &str = "DELETE FROM records WHERE kind = ?1 AND id = ?2";

pub const DELETE_ALL_RECORDS: &str = "DELETE FROM records WHERE kind = ?1";

// ============================================================================
// Key index queries
// ============================================================================

pub const SELECT_ID_BY_UNIQUE_KEY: &str = r#"
SELECT id FROM record_keys
WHERE kind = ?1 AND field = ?2 AND value = ?3 AND is_unique = 1
"#;

pub const INSERT_KEY: &str = r#"
INSERT INTO record_keys (kind, field, value, id, is_unique)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const DELETE_KEYS_FOR_RECORD: &str = "DELETE FROM record_keys WHERE kind = ?1 AND id = ?2";

pub const DELETE_ALL_KEYS: &str = "DELETE FROM record_keys WHERE kind = ?1";
