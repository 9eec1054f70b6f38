//! SQL DDL for the shared device-registration store.
//!
//! The table and column names match the database the companion server
//! already writes, so the DDL only fills in tables that don't exist yet.

/// SQLite schema:
/// - `users` keyed by the external identity id
/// - `entryKeys` pairing codes, mutated exactly once (unclaimed -> claimed)
/// - `deviceOwners` composite key (userId, serial); serial uniqueness is
///   enforced by the insert statement, not a constraint, to keep the table
///   shape identical to the externally-created one
/// - `integrations` composite key (userId, type)
///
/// All timestamps are integer epoch milliseconds.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    clerkId TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    createdAt INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS entryKeys (
    code TEXT PRIMARY KEY,
    serial TEXT NOT NULL,
    expiresAt INTEGER NOT NULL,
    claimedBy TEXT NULL,
    claimedAt INTEGER NULL
);

CREATE TABLE IF NOT EXISTS deviceOwners (
    userId TEXT NOT NULL,
    serial TEXT NOT NULL,
    createdAt INTEGER NOT NULL,
    PRIMARY KEY (userId, serial)
);

CREATE TABLE IF NOT EXISTS integrations (
    userId TEXT NOT NULL,
    type TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 0,
    config TEXT NOT NULL,
    createdAt INTEGER NOT NULL,
    updatedAt INTEGER NOT NULL,
    PRIMARY KEY (userId, type)
);
"#;
