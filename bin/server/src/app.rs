//! Webhook routes and handlers.
//!
//! Webhook handlers answer the transport provider, not the tenant: replies
//! go out through the REST sender, so the webhook body is empty. Internal
//! failures are logged and answered with 200 to keep the provider from
//! retrying; only a malformed payload earns a 400.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use parkline_engine::{send_rent_reminders, ConversationEngine, EngineError};
use parkline_transport::{InboundMessage, Transport};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub transport: Arc<dyn Transport>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/sms", post(webhook_sms))
        .route("/webhook/voice", post(webhook_voice))
        .route("/admin/refresh", post(admin_refresh))
        .route("/admin/reminders", post(admin_reminders))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Twilio-style inbound SMS form.
#[derive(Debug, Deserialize)]
struct SmsForm {
    #[serde(rename = "From", default)]
    from: String,
    #[serde(rename = "Body", default)]
    body: String,
}

async fn webhook_sms(State(state): State<AppState>, Form(form): Form<SmsForm>) -> StatusCode {
    let message = InboundMessage::sms(form.from, form.body);
    if !message.has_sender() {
        return StatusCode::BAD_REQUEST;
    }
    match state.engine.handle_inbound(&message).await {
        Ok(()) => {}
        Err(EngineError::MissingSender) => return StatusCode::BAD_REQUEST,
        Err(e) => {
            // State has advanced where it could; nothing for the provider
            // to retry.
            tracing::error!(sender = %message.sender, error = %e, "inbound handling failed");
        }
    }
    StatusCode::OK
}

/// Twilio-style inbound voice form.
#[derive(Debug, Deserialize)]
struct VoiceForm {
    #[serde(rename = "From", default)]
    from: String,
}

async fn webhook_voice(
    State(state): State<AppState>,
    Form(form): Form<VoiceForm>,
) -> impl IntoResponse {
    let prompt = state.engine.handle_voice(&form.from).await;
    let twiml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Say>{prompt}</Say></Response>"
    );
    ([(header::CONTENT_TYPE, "text/xml")], twiml)
}

async fn admin_refresh(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.refresh_directory().await {
        Ok(tenants) => (StatusCode::OK, Json(json!({ "tenants": tenants }))),
        Err(e) => {
            tracing::error!(error = %e, "directory refresh failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

async fn admin_reminders(State(state): State<AppState>) -> impl IntoResponse {
    let directory = state.engine.directory();
    let report = send_rent_reminders(directory.as_ref(), state.transport.as_ref()).await;
    Json(json!({
        "tenants": report.tenants,
        "sent": report.sent,
        "failed": report.failed,
    }))
}
