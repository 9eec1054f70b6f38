use crate::error::EmberlinkError;
use crate::router::EmberlinkState;
use crate::service::{ClaimOutcome, normalize_entry_code};
use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub code: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    pub message: String,
}

/// GET /api/devices -> ownership rows for the default user as
/// `[{serial, createdAt}]`.
pub async fn list_devices(state: &EmberlinkState) -> Result<Response, EmberlinkError> {
    let devices = state
        .registration
        .devices_for_user(&state.default_user)
        .await?;
    Ok(Json(devices).into_response())
}

/// POST /api/register with `{code, userId}`. Field and format problems are
/// 400s; an unclaimable code is a regular `success: false` payload, not an
/// HTTP error.
pub async fn register(state: &EmberlinkState, body: &[u8]) -> Result<Response, EmberlinkError> {
    let req: RegisterRequest = serde_json::from_slice(body)
        .map_err(|_| EmberlinkError::validation("Invalid JSON body"))?;

    let (Some(code), Some(user_id)) = (req.code, req.user_id) else {
        return Err(EmberlinkError::validation(
            "Missing required fields: code, userId",
        ));
    };

    let Some(code) = normalize_entry_code(&code) else {
        return Err(EmberlinkError::validation(
            "Invalid entry code format. Must be exactly 7 alphanumeric characters.",
        ));
    };

    let response = match state.registration.claim(&code, &user_id).await? {
        ClaimOutcome::Claimed { serial } => RegisterResponse {
            success: true,
            message: format!("Device {serial} registered to {user_id}"),
            serial: Some(serial),
        },
        ClaimOutcome::NotClaimable => RegisterResponse {
            success: false,
            serial: None,
            message: "Invalid, expired, or already claimed entry key".to_string(),
        },
    };
    Ok(Json(response).into_response())
}
