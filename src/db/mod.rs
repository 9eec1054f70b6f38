//! Database module: models and schema for the shared registration store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{EntryKeyRow, IntegrationRow, OwnedDevice, UserRow};
pub use schema::SQLITE_INIT;
pub use sqlite::{RegistryStorage, SqlitePool};
