//! SQL schema for the check-tree SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- A parent exclusively owns its children: deleting it deletes the subtree.
CREATE TABLE IF NOT EXISTS nodes (
    id          INTEGER PRIMARY KEY,
    created_at  TEXT NOT NULL,
    kind        TEXT NOT NULL CHECK (kind IN ('ROOT', 'CHECK', 'SUB_CHECK')),
    name        TEXT NOT NULL,
    status      TEXT CHECK (status IN ('PASS', 'FAIL')),   -- NULL = unevaluated
    reason      TEXT,
    parent_id   INTEGER REFERENCES nodes(id) ON DELETE CASCADE,
    CHECK ((kind = 'ROOT') = (parent_id IS NULL))
);

-- Status changes are strictly append-only; the triggers below reject any
-- UPDATE or DELETE. node_id is a plain reference so records outlive nodes.
CREATE TABLE IF NOT EXISTS status_changes (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    node_id         INTEGER NOT NULL,
    old_status      TEXT,
    new_status      TEXT NOT NULL,
    changed_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    user_change_at  TEXT             -- set only on user overrides
);

CREATE TRIGGER IF NOT EXISTS status_changes_no_update
BEFORE UPDATE ON status_changes
BEGIN
    SELECT RAISE(ABORT, 'status_changes is append-only');
END;

CREATE TRIGGER IF NOT EXISTS status_changes_no_delete
BEFORE DELETE ON status_changes
BEGIN
    SELECT RAISE(ABORT, 'status_changes is append-only');
END;

CREATE INDEX IF NOT EXISTS nodes_parent_idx        ON nodes(parent_id);
CREATE INDEX IF NOT EXISTS nodes_kind_idx          ON nodes(kind);
CREATE INDEX IF NOT EXISTS status_changes_node_idx ON status_changes(node_id);
CREATE INDEX IF NOT EXISTS status_changes_user_idx ON status_changes(user_change_at);

PRAGMA user_version = 1;
";
