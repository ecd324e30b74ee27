//! Database schema and migrations for filedock.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table, populated from identity-provider sign-ins
    r#"
-- Users are created on first sign-in and refreshed afterwards; never deleted.
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    external_id TEXT NOT NULL UNIQUE,       -- identity-provider subject
    picture     TEXT,                       -- profile image URL
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_email ON users(email);
CREATE INDEX idx_users_external_id ON users(external_id);
"#,
    // v2: Files table - metadata and blob references
    r#"
-- File metadata; content lives in blob storage under blob_key.
-- deleted = 1 marks the file as trashed (soft delete).
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    blob_key    TEXT NOT NULL,
    blob_locator TEXT NOT NULL,
    mime_type   TEXT NOT NULL,
    size        INTEGER NOT NULL,
    owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    deleted     INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_owner_id ON files(owner_id);
CREATE INDEX idx_files_owner_deleted ON files(owner_id, deleted);
"#,
    // v3: File shares table - per-user, per-file permission grants
    r#"
-- At most one grant per (file, grantee); concurrent grant calls serialize
-- on the UNIQUE constraint via INSERT .. ON CONFLICT upserts.
CREATE TABLE file_shares (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id     INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    grantee_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    granter_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    permission  TEXT NOT NULL,              -- 'read', 'edit', 'delete'
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (file_id, grantee_id)
);

CREATE INDEX idx_file_shares_file_id ON file_shares(file_id);
CREATE INDEX idx_file_shares_grantee_id ON file_shares(grantee_id);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_migrations_contain_core_tables() {
        let all: String = MIGRATIONS.concat();
        assert!(all.contains("CREATE TABLE users"));
        assert!(all.contains("CREATE TABLE files"));
        assert!(all.contains("CREATE TABLE file_shares"));
        assert!(all.contains("UNIQUE (file_id, grantee_id)"));
    }
}
