use crate::db::RegistryStorage;
use crate::db::models::OwnedDevice;
use crate::error::EmberlinkError;
use tracing::{info, warn};

/// Pairing codes are exactly 7 ASCII alphanumeric characters.
pub const ENTRY_CODE_LEN: usize = 7;

/// Trim and validate a raw pairing code, normalizing it to uppercase for
/// lookup. Returns `None` for anything that isn't exactly 7 ASCII
/// alphanumeric characters, so malformed input never reaches the store.
pub fn normalize_entry_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() != ENTRY_CODE_LEN || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed { serial: String },
    /// Unknown, expired, or already-claimed code. The causes are collapsed
    /// on purpose; the log line is the only place they differ.
    NotClaimable,
}

/// Claim-and-register workflow over the registration store.
#[derive(Clone)]
pub struct RegistrationService {
    storage: RegistryStorage,
}

impl RegistrationService {
    pub fn new(storage: RegistryStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &RegistryStorage {
        &self.storage
    }

    /// Claim `code` for `user_id` and record device ownership. Expects a
    /// normalized code (see [`normalize_entry_code`]).
    pub async fn claim(
        &self,
        code: &str,
        user_id: &str,
    ) -> Result<ClaimOutcome, EmberlinkError> {
        let Some(serial) = self.storage.claim_entry_key(code, user_id).await? else {
            self.log_rejection(code).await?;
            return Ok(ClaimOutcome::NotClaimable);
        };

        info!(code, %serial, user_id, "claimed entry key");

        if self.storage.register_device(user_id, &serial).await? {
            info!(%serial, user_id, "registered device");
        } else {
            // First claimant keeps the device; the losing registration is
            // skipped rather than reassigned.
            let owner = self.storage.owner_of(&serial).await?;
            warn!(
                %serial,
                owner = owner.as_deref().unwrap_or("<unknown>"),
                "device already registered, skipping"
            );
        }

        Ok(ClaimOutcome::Claimed { serial })
    }

    pub async fn devices_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<OwnedDevice>, EmberlinkError> {
        self.storage.devices_for_user(user_id).await
    }

    pub async fn remove_device(
        &self,
        user_id: &str,
        serial: &str,
    ) -> Result<bool, EmberlinkError> {
        let removed = self.storage.delete_device(user_id, serial).await?;
        if removed {
            info!(serial, user_id, "deleted device ownership");
        } else {
            warn!(serial, user_id, "device not found for user");
        }
        Ok(removed)
    }

    /// Diagnostic re-read after a failed claim, only to say why on the log.
    async fn log_rejection(&self, code: &str) -> Result<(), EmberlinkError> {
        let now = chrono::Utc::now().timestamp_millis();
        match self.storage.entry_key(code).await? {
            None => warn!(code, "entry key not found"),
            Some(key) if key.claimed_by.is_some() => warn!(code, "entry key already claimed"),
            Some(key) if key.expires_at < now => warn!(code, "entry key expired"),
            Some(_) => warn!(code, "entry key not claimable"),
        }
        Ok(())
    }
}
