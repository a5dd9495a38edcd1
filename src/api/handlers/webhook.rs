use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::{debug, info, warn};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{WebhookRequest, WebhookResponse, SMS_RECEIVED_EVENT};

/// POST /webhook/sms
/// Stores an SMS from the heating controller and updates the zones it reports on
pub async fn receive_sms(
    State(state): State<AppState>,
    body: std::result::Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<Json<WebhookResponse>> {
    if state.webhook.require_auth_session && !state.service.session().has_authenticated() {
        return Err(AppError::Forbidden(
            "Not authenticated with data store".to_string(),
        ));
    }

    let Json(request) = body?;

    if request.event != SMS_RECEIVED_EVENT {
        return Err(AppError::Validation("Invalid event type".to_string()));
    }

    let payload = request
        .sms_payload()
        .ok_or_else(|| AppError::Validation("Missing payload".to_string()))?
        .map_err(|e| AppError::Validation(format!("Invalid payload: {}", e)))?;

    // Sender numbers stay out of info-level logs
    if let Some(allowed) = state.webhook.allowed_phone_number.as_deref() {
        if payload.phone_number != allowed {
            warn!("rejected SMS from unknown sender");
            debug!(phone_number = %payload.phone_number, "unknown sender");
            return Err(AppError::Validation("Unauthorized phone number".to_string()));
        }
    }

    info!(received_at = ?payload.received_at, "received SMS");
    debug!(phone_number = %payload.phone_number, "SMS sender");

    let record = state.service.process(&payload).await?;

    Ok(Json(WebhookResponse {
        success: true,
        message_id: record.id,
    }))
}
