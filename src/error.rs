use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EmberlinkError {
    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing MQTT configuration: MQTT_HOST and MQTT_PORT required")]
    MissingMqttConfig,

    #[error("{0}")]
    Validation(String),
}

impl EmberlinkError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl IntoResponse for EmberlinkError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            EmberlinkError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Driver details stay on the server log, not in the response body.
            EmberlinkError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
            EmberlinkError::Json(_) | EmberlinkError::MissingMqttConfig => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };
        (status, Json(ApiError { error: message })).into_response()
    }
}

/// Flat error body: `{"error": "..."}`.
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
}
