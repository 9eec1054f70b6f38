//! One-time MQTT integration setup, run before the HTTP listener starts.
//!
//! Writes the broker configuration the companion server polls for into the
//! `integrations` table. Idempotent: reruns update the existing row.

use crate::config::Config;
use crate::db::RegistryStorage;
use crate::error::EmberlinkError;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const INTEGRATION_TYPE: &str = "mqtt";
pub const TOPIC_PREFIX: &str = "emberlink";
pub const DISCOVERY_PREFIX: &str = "homeassistant";

/// Config blob persisted in `integrations.config`, camelCase on disk so the
/// companion server can read it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttIntegrationConfig {
    pub broker_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub client_id: String,
    pub topic_prefix: String,
    pub discovery_prefix: String,
    pub publish_raw: bool,
    pub home_assistant_discovery: bool,
}

impl MqttIntegrationConfig {
    pub fn build(
        host: &str,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        user_id: &str,
    ) -> Self {
        Self {
            broker_url: format!("mqtt://{host}:{port}"),
            username,
            password,
            client_id: format!("{TOPIC_PREFIX}-{user_id}"),
            topic_prefix: TOPIC_PREFIX.to_string(),
            discovery_prefix: DISCOVERY_PREFIX.to_string(),
            publish_raw: true,
            home_assistant_discovery: true,
        }
    }
}

/// Upsert the MQTT integration row for the default user. Missing broker
/// endpoint config is a fatal startup error; a failed verification re-read
/// is logged but not fatal.
pub async fn initialize(storage: &RegistryStorage, cfg: &Config) -> Result<(), EmberlinkError> {
    info!("starting MQTT integration initialization");

    let (Some(host), Some(port)) = (cfg.mqtt_host.as_deref(), cfg.mqtt_port) else {
        return Err(EmberlinkError::MissingMqttConfig);
    };

    info!(
        host,
        port,
        user = cfg.mqtt_user.as_deref().unwrap_or("(none)"),
        "MQTT configuration detected"
    );

    let mqtt = MqttIntegrationConfig::build(
        host,
        port,
        cfg.mqtt_user.clone(),
        cfg.mqtt_password.clone(),
        &cfg.default_user_id,
    );
    let config_json = serde_json::to_string(&mqtt)?;

    storage
        .upsert_integration(&cfg.default_user_id, INTEGRATION_TYPE, true, &config_json)
        .await?;

    info!(
        user_id = %cfg.default_user_id,
        broker = %mqtt.broker_url,
        topic_prefix = TOPIC_PREFIX,
        discovery = mqtt.home_assistant_discovery,
        "MQTT integration configured"
    );

    // Confirm the row actually landed; the companion server polls for it.
    match storage
        .integration(&cfg.default_user_id, INTEGRATION_TYPE)
        .await?
    {
        Some(row) => info!(enabled = row.enabled, "verified MQTT integration row"),
        None => error!("MQTT integration row missing after upsert"),
    }

    Ok(())
}
