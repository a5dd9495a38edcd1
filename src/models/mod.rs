pub mod heating;
pub mod message;
pub mod webhook;

pub use heating::{HeatingState, ParsedMessage, Zone};
pub use message::{MessageRecord, NewMessage};
pub use webhook::{SmsPayload, WebhookRequest, WebhookResponse, SMS_RECEIVED_EVENT};
