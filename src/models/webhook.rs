use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::NewMessage;

pub const SMS_RECEIVED_EVENT: &str = "sms:received";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub event: String,
    /// Decoded lazily with [`WebhookRequest::sms_payload`] so an unexpected event is
    /// rejected before its payload shape matters.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

impl WebhookRequest {
    /// `None` when the payload is absent or `null`.
    pub fn sms_payload(&self) -> Option<Result<SmsPayload, serde_json::Error>> {
        self.payload
            .as_ref()
            .filter(|value| !value.is_null())
            .map(|value| SmsPayload::deserialize(value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsPayload {
    pub message: String,
    pub phone_number: String,
    /// Gateway timestamp; the time of arrival is used when absent
    #[serde(default)]
    pub received_at: Option<String>,
}

impl From<&SmsPayload> for NewMessage {
    fn from(payload: &SmsPayload) -> Self {
        NewMessage {
            message: payload.message.clone(),
            phone_number: payload.phone_number.clone(),
            received_at: payload
                .received_at
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    pub message_id: String,
}
