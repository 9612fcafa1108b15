//! SQLite schema.

/// One row per storage key; values are JSON text.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Key-Value Store (doctors, camps, screening records, autosave draft)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
