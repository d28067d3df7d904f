//! HTTP request handlers

use crate::api::server::AppState;
use crate::catalog::{self, BackgroundInfo};
use crate::delivery::DeliveryView;
use crate::engine::StartSessionRequest;
use crate::state::SessionStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use booth_common::events::ChannelKind;
use booth_common::{Error, StyleFilter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Map a booth error to its HTTP status and JSON body
fn error_response(e: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Busy(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

type HandlerResult<T> = std::result::Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    port: u16,
    email_configured: bool,
    sms_configured: bool,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "booth-kiosk".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        port: state.port,
        email_configured: state.engine.email_configured(),
        sms_configured: state.engine.sms_configured(),
    })
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    session_id: Uuid,
}

/// POST /api/v1/session/start
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> HandlerResult<StartSessionResponse> {
    let session_id = state
        .engine
        .start_session(request)
        .await
        .map_err(error_response)?;
    Ok(Json(StartSessionResponse { session_id }))
}

/// POST /api/v1/session/abort
pub async fn abort_session(
    State(state): State<AppState>,
) -> HandlerResult<StartSessionResponse> {
    let session_id = state.engine.abort_session().await.map_err(error_response)?;
    Ok(Json(StartSessionResponse { session_id }))
}

/// GET /api/v1/session/status
pub async fn session_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.engine.status().await)
}

#[derive(Debug, Serialize)]
pub struct BackgroundsResponse {
    backgrounds: Vec<BackgroundInfo>,
}

/// GET /api/v1/backgrounds
pub async fn list_backgrounds() -> Json<BackgroundsResponse> {
    Json(BackgroundsResponse {
        backgrounds: catalog::catalog().iter().map(|bg| bg.info()).collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct StylesResponse {
    styles: Vec<&'static str>,
}

/// GET /api/v1/styles
pub async fn list_styles() -> Json<StylesResponse> {
    Json(StylesResponse {
        styles: StyleFilter::all_variants()
            .iter()
            .map(|s| s.as_str())
            .collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct DeliveryStatusResponse {
    session_id: Uuid,
    deliveries: Vec<DeliveryView>,
}

/// GET /api/v1/delivery/:session_id
pub async fn delivery_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> HandlerResult<DeliveryStatusResponse> {
    let deliveries = state.engine.dispatcher().statuses(session_id).await;
    if deliveries.is_empty() {
        return Err(error_response(Error::NotFound(format!(
            "no deliveries for session {}",
            session_id
        ))));
    }
    Ok(Json(DeliveryStatusResponse {
        session_id,
        deliveries,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub session_id: Uuid,
    pub channel: String,
}

#[derive(Debug, Serialize)]
pub struct ResendResponse {
    status: String,
}

/// POST /api/v1/delivery/resend
pub async fn resend_delivery(
    State(state): State<AppState>,
    Json(request): Json<ResendRequest>,
) -> HandlerResult<ResendResponse> {
    let channel = ChannelKind::from_str(&request.channel).ok_or_else(|| {
        error_response(Error::InvalidInput(format!(
            "unknown delivery channel '{}'",
            request.channel
        )))
    })?;

    state
        .engine
        .dispatcher()
        .resend(request.session_id, channel)
        .await
        .map_err(error_response)?;
    Ok(Json(ResendResponse {
        status: "ok".to_string(),
    }))
}
