use crate::db::RegistryStorage;
use crate::error::EmberlinkError;
use crate::handlers;
use crate::service::RegistrationService;
use axum::Router;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Cap on /api/register body reads.
const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct EmberlinkState {
    pub registration: RegistrationService,
    pub default_user: Arc<str>,
}

impl EmberlinkState {
    pub fn new(storage: RegistryStorage, default_user: impl Into<Arc<str>>) -> Self {
        Self {
            registration: RegistrationService::new(storage),
            default_user: default_user.into(),
        }
    }
}

pub fn emberlink_router(state: EmberlinkState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-ingress-path"),
        ])
}

/// Routes by path *suffix* so the same handlers answer both direct requests
/// and requests arriving under a reverse-proxy ingress prefix.
async fn dispatch(State(state): State<EmberlinkState>, req: Request) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let result = if path.ends_with('/') {
        Ok(handlers::home(req.headers(), &state.default_user))
    } else if path.ends_with("/api/devices") && method == Method::GET {
        handlers::list_devices(&state).await
    } else if path.ends_with("/api/register") && method == Method::POST {
        match to_bytes(req.into_body(), BODY_LIMIT).await {
            Ok(body) => handlers::register(&state, &body).await,
            Err(_) => Err(EmberlinkError::validation("Unable to read request body")),
        }
    } else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            match &err {
                EmberlinkError::Validation(_) => {
                    tracing::warn!(error = %err, %method, %path, "request rejected")
                }
                _ => tracing::error!(error = %err, %method, %path, "request failed"),
            }
            err.into_response()
        }
    }
}
