use crate::db::models::{EntryKeyRow, IntegrationRow, OwnedDevice, UserRow};
use crate::db::schema::SQLITE_INIT;
use crate::error::EmberlinkError;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub type SqlitePool = Pool<Sqlite>;

/// Pooled access to the shared registration store. Every statement checks a
/// connection out of the pool and returns it on all exit paths, so no
/// operation can leak a connection across an error.
#[derive(Clone)]
pub struct RegistryStorage {
    pool: SqlitePool,
}

impl RegistryStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file and make sure the schema exists.
    pub async fn connect(path: &Path) -> Result<Self, EmberlinkError> {
        let connect_opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), EmberlinkError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert the user row if it doesn't exist yet. Returns whether a row
    /// was created; an existing row is left untouched.
    pub async fn ensure_user(&self, user_id: &str, email: &str) -> Result<bool, EmberlinkError> {
        let res = sqlx::query(
            r#"
            INSERT INTO users (clerkId, email, createdAt)
            VALUES (?, ?, ?)
            ON CONFLICT(clerkId) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<UserRow>, EmberlinkError> {
        let row = sqlx::query("SELECT clerkId, email, createdAt FROM users WHERE clerkId = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_user).transpose()
    }

    /// Claim a pairing code for `user_id`. The WHERE clause carries the
    /// whole claimability check, so the update either wins the code
    /// atomically or affects no rows; two concurrent claims cannot both
    /// succeed. Returns the device serial on success, `None` when the code
    /// is unknown, expired, or already claimed.
    pub async fn claim_entry_key(
        &self,
        code: &str,
        user_id: &str,
    ) -> Result<Option<String>, EmberlinkError> {
        let now = Utc::now().timestamp_millis();
        let res = sqlx::query(
            r#"
            UPDATE entryKeys SET claimedBy = ?, claimedAt = ?
            WHERE code = ? AND claimedBy IS NULL AND expiresAt >= ?
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(code)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }

        let rec: (String,) = sqlx::query_as("SELECT serial FROM entryKeys WHERE code = ?")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(Some(rec.0))
    }

    pub async fn entry_key(&self, code: &str) -> Result<Option<EntryKeyRow>, EmberlinkError> {
        let row = sqlx::query(
            r#"SELECT code, serial, expiresAt, claimedBy, claimedAt
               FROM entryKeys WHERE code = ?"#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_entry_key).transpose()
    }

    /// Create the ownership row unless the serial is already owned by
    /// anyone. The guard runs inside the INSERT itself, so concurrent
    /// registrations of one serial leave exactly one row (first writer
    /// wins). Returns whether this call created the row.
    pub async fn register_device(
        &self,
        user_id: &str,
        serial: &str,
    ) -> Result<bool, EmberlinkError> {
        let res = sqlx::query(
            r#"
            INSERT INTO deviceOwners (userId, serial, createdAt)
            SELECT ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM deviceOwners WHERE serial = ?)
            "#,
        )
        .bind(user_id)
        .bind(serial)
        .bind(Utc::now().timestamp_millis())
        .bind(serial)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Current owner of a serial, if any.
    pub async fn owner_of(&self, serial: &str) -> Result<Option<String>, EmberlinkError> {
        let rec: Option<(String,)> =
            sqlx::query_as("SELECT userId FROM deviceOwners WHERE serial = ?")
                .bind(serial)
                .fetch_optional(&self.pool)
                .await?;
        Ok(rec.map(|r| r.0))
    }

    /// All devices owned by the user, newest registration first.
    pub async fn devices_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<OwnedDevice>, EmberlinkError> {
        let rows = sqlx::query(
            r#"SELECT serial, createdAt FROM deviceOwners
               WHERE userId = ? ORDER BY createdAt DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_owned_device).collect()
    }

    /// Remove the ownership row matching both user and serial. Returns
    /// whether a row was actually removed.
    pub async fn delete_device(&self, user_id: &str, serial: &str) -> Result<bool, EmberlinkError> {
        let res = sqlx::query("DELETE FROM deviceOwners WHERE userId = ? AND serial = ?")
            .bind(user_id)
            .bind(serial)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Upsert by composite (userId, type). Insert sets both timestamps;
    /// update keeps `createdAt` and refreshes `updatedAt`.
    /// Uses SQLite `INSERT ... ON CONFLICT(userId, type) DO UPDATE`.
    pub async fn upsert_integration(
        &self,
        user_id: &str,
        kind: &str,
        enabled: bool,
        config_json: &str,
    ) -> Result<(), EmberlinkError> {
        let now = Utc::now().timestamp_millis();
        let enabled_i = if enabled { 1 } else { 0 };
        sqlx::query(
            r#"
            INSERT INTO integrations (userId, type, enabled, config, createdAt, updatedAt)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(userId, type) DO UPDATE SET
                enabled=excluded.enabled,
                config=excluded.config,
                updatedAt=excluded.updatedAt
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(enabled_i)
        .bind(config_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn integration(
        &self,
        user_id: &str,
        kind: &str,
    ) -> Result<Option<IntegrationRow>, EmberlinkError> {
        let row = sqlx::query(
            r#"SELECT userId, type, enabled, config, createdAt, updatedAt
               FROM integrations WHERE userId = ? AND type = ?"#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_integration).transpose()
    }

    fn row_to_entry_key(row: SqliteRow) -> Result<EntryKeyRow, EmberlinkError> {
        Ok(EntryKeyRow {
            code: row.try_get("code")?,
            serial: row.try_get("serial")?,
            expires_at: row.try_get("expiresAt")?,
            claimed_by: row.try_get("claimedBy")?,
            claimed_at: row.try_get("claimedAt")?,
        })
    }

    fn row_to_owned_device(row: SqliteRow) -> Result<OwnedDevice, EmberlinkError> {
        Ok(OwnedDevice {
            serial: row.try_get("serial")?,
            created_at: row.try_get("createdAt")?,
        })
    }

    fn row_to_user(row: SqliteRow) -> Result<UserRow, EmberlinkError> {
        Ok(UserRow {
            clerk_id: row.try_get("clerkId")?,
            email: row.try_get("email")?,
            created_at: row.try_get("createdAt")?,
        })
    }

    fn row_to_integration(row: SqliteRow) -> Result<IntegrationRow, EmberlinkError> {
        let enabled_i: i64 = row.try_get("enabled")?;
        Ok(IntegrationRow {
            user_id: row.try_get("userId")?,
            kind: row.try_get("type")?,
            enabled: enabled_i != 0,
            config: row.try_get("config")?,
            created_at: row.try_get("createdAt")?,
            updated_at: row.try_get("updatedAt")?,
        })
    }
}
