use figment::{Figment, providers::Env};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Environment variables the service reads. Anything else in the
/// environment is ignored so unrelated addon variables cannot collide
/// with config fields.
const ENV_KEYS: &[&str] = &[
    "SQLITE3_DB_PATH",
    "MQTT_HOST",
    "MQTT_PORT",
    "MQTT_USER",
    "MQTT_PASSWORD",
    "INGRESS_PORT",
    "DEFAULT_USER_ID",
    "DEFAULT_USER_EMAIL",
    "LOGLEVEL",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the shared SQLite database file.
    #[serde(default = "default_db_path")]
    pub sqlite3_db_path: PathBuf,

    /// MQTT broker endpoint. Both are required for startup to succeed,
    /// but validation happens in the MQTT init task so the failure is a
    /// proper fatal error rather than a config-parse panic.
    pub mqtt_host: Option<String>,
    pub mqtt_port: Option<u16>,
    pub mqtt_user: Option<String>,
    pub mqtt_password: Option<String>,

    /// Port the web UI listens on (ingress-facing).
    #[serde(default = "default_ingress_port")]
    pub ingress_port: u16,

    /// Identity that owns devices and the integration config row.
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
    #[serde(default = "default_user_email")]
    pub default_user_email: String,

    #[serde(default = "default_loglevel")]
    pub loglevel: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/data/database.sqlite")
}

fn default_ingress_port() -> u16 {
    8082
}

fn default_user_id() -> String {
    "homeassistant".to_string()
}

fn default_user_email() -> String {
    "homeassistant@local".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().unwrap_or_else(|e| panic!("invalid environment configuration: {e}"))
});
