use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::SessionManager;
use crate::error::Result;
use crate::models::{MessageRecord, NewMessage, SmsPayload};
use crate::parser;
use crate::repositories::DataStore;

/// Persists an inbound controller SMS and the zone state derived from it.
#[derive(Clone)]
pub struct SmsService {
    store: Arc<dyn DataStore>,
    session: SessionManager,
}

impl SmsService {
    pub fn new(store: Arc<dyn DataStore>, session: SessionManager) -> Self {
        Self { store, session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Appends the raw message, then updates every zone the message mentions.
    ///
    /// Zone writes happen sequentially in fixed zone order. A failure stops
    /// processing without undoing earlier writes.
    pub async fn process(&self, payload: &SmsPayload) -> Result<MessageRecord> {
        let store = self.store.as_ref();
        let new_message = &NewMessage::from(payload);

        let record = self
            .session
            .with_retry("create message", |token| async move {
                store.create_message(&token, new_message).await
            })
            .await?;
        info!(message_id = %record.id, "message stored");

        let parsed = parser::parse(&payload.message);
        debug!(?parsed, "parsed message");

        for zone in parsed.zones() {
            let Some(state) = parsed.heating_state(zone) else {
                continue;
            };
            let state = &state;

            self.session
                .with_retry("update heating state", |token| async move {
                    store.update_heating_state(&token, zone, state).await
                })
                .await?;
            debug!(zone = %zone, temperature = ?state.temperature, "zone state updated");
        }

        Ok(record)
    }
}
