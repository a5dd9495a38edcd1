pub mod health;
pub mod webhook;

use crate::config::WebhookConfig;
use crate::services::SmsService;

#[derive(Clone)]
pub struct AppState {
    pub service: SmsService,
    pub webhook: WebhookConfig,
}
