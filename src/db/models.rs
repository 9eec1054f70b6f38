use serde::{Deserialize, Serialize};

/// A pairing code row. `claimed_by`/`claimed_at` are set exactly once when
/// the code is claimed; the row is terminal afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryKeyRow {
    pub code: String,
    pub serial: String,
    pub expires_at: i64,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<i64>,
}

/// Ownership row as surfaced by the devices API: `{serial, createdAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedDevice {
    pub serial: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub clerk_id: String,
    pub email: String,
    pub created_at: i64,
}

/// Integration config row keyed by (userId, type). `config` is an opaque
/// JSON blob consumed by the companion server.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationRow {
    pub user_id: String,
    pub kind: String,
    pub enabled: bool,
    pub config: String,
    pub created_at: i64,
    pub updated_at: i64,
}
