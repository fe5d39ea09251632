//! HTTP API for the broadcast backend.
//!
//! Five routes, consumed by the frontend proxy:
//! `GET /api/status`, `GET /api/connect`, `GET /api/groups`,
//! `POST /api/pushkontak`, `POST /api/save-contacts`. All responses are
//! JSON; failures carry an `error` field and never escape as uncaught
//! panics past this boundary.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::bot::archiver::ContactArchiver;
use crate::bot::broadcast::BroadcastJob;
use crate::bot::directory::DirectoryService;
use crate::bot::session::{SessionManager, SessionState};
use crate::bot::BotError;
use crate::whatsapp::WhatsAppError;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide session manager.
    pub session: Arc<SessionManager>,
    /// Group directory.
    pub directory: Arc<DirectoryService>,
    /// Broadcast job executor.
    pub broadcast: Arc<BroadcastJob>,
    /// Contact archiver.
    pub archiver: Arc<ContactArchiver>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/connect", get(connect))
        .route("/api/groups", get(groups))
        .route("/api/pushkontak", post(pushkontak))
        .route("/api/save-contacts", post(save_contacts))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Serve the API on the given listener until a shutdown signal arrives.
///
/// # Errors
///
/// Returns the underlying I/O error if the server fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

/// JSON error response: `{"error": "..."}` with a matching status code.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<BotError> for ApiError {
    fn from(e: BotError) -> Self {
        let status = match &e {
            BotError::SessionNotReady | BotError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            // The bridge itself is unreachable, as opposed to a rejected call.
            BotError::Bridge(WhatsAppError::Http(_)) => StatusCode::BAD_GATEWAY,
            BotError::GroupNotFound(_) | BotError::Bridge(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let status = state.session.status().await;
    let label = if status.state == SessionState::Connected {
        "connected"
    } else {
        "disconnected"
    };
    Json(json!({ "status": label, "qr": status.qr }))
}

async fn connect(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let status = state.session.connect().await?;
    let body = match (status.state, status.qr) {
        (SessionState::Connected, _) => json!({ "status": "connected" }),
        (_, Some(qr)) => json!({ "qr": qr, "status": "scan_qr" }),
        (_, None) => json!({ "status": "generating_qr" }),
    };
    Ok(Json(body))
}

async fn groups(State(state): State<AppState>) -> Json<Value> {
    let groups = state.directory.list_groups().await;
    Json(json!({ "groups": groups }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PushKontakRequest {
    group_id: Option<String>,
    message: Option<String>,
}

async fn pushkontak(
    State(state): State<AppState>,
    Json(req): Json<PushKontakRequest>,
) -> Result<Json<Value>, ApiError> {
    if state.session.status().await.state != SessionState::Connected {
        return Err(ApiError::bad_request("WhatsApp not connected"));
    }
    let group_id = req.group_id.filter(|s| !s.is_empty());
    let message = req.message.filter(|s| !s.is_empty());
    let (Some(group_id), Some(message)) = (group_id, message) else {
        return Err(ApiError::bad_request("Group ID and message required"));
    };

    let outcome = state.broadcast.run(&group_id, &message).await?;
    Ok(Json(json!({ "success": true, "message": outcome.summary })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SaveContactsRequest {
    group_id: Option<String>,
}

async fn save_contacts(
    State(state): State<AppState>,
    Json(req): Json<SaveContactsRequest>,
) -> Result<Json<Value>, ApiError> {
    if state.session.status().await.state != SessionState::Connected {
        return Err(ApiError::bad_request("WhatsApp not connected"));
    }
    let Some(group_id) = req.group_id.filter(|s| !s.is_empty()) else {
        return Err(ApiError::bad_request("Group ID required"));
    };

    let outcome = state.archiver.archive(&group_id).await?;
    Ok(Json(json!({
        "success": true,
        "saved": outcome.saved,
        "contacts": outcome.records,
    })))
}
