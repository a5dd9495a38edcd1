use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{HeatingState, MessageRecord, NewMessage, Zone};

pub const MESSAGES_COLLECTION: &str = "messages";
pub const HEATING_STATE_COLLECTION: &str = "heating_state";

/// Operations this service needs from the backing data store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Exchanges service-account credentials for a session token.
    async fn authenticate(&self, identity: &str, password: &str) -> Result<String>;

    async fn create_message(&self, token: &str, message: &NewMessage) -> Result<MessageRecord>;

    /// Updates the pre-provisioned record of a zone. Records are never created here.
    async fn update_heating_state(
        &self,
        token: &str,
        zone: Zone,
        state: &HeatingState,
    ) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// PocketBase REST client.
#[derive(Clone)]
pub struct PocketBaseClient {
    base_url: String,
    auth_collection: String,
    http_client: reqwest::Client,
}

impl PocketBaseClient {
    pub fn new(base_url: impl Into<String>, auth_collection: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_collection: auth_collection.into(),
            http_client: reqwest::Client::new(),
        }
    }

    fn collection_url(&self, collection: &str, path: &str) -> String {
        format!("{}/api/collections/{}/{}", self.base_url, collection, path)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::DataStore {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DataStore for PocketBaseClient {
    async fn authenticate(&self, identity: &str, password: &str) -> Result<String> {
        let url = self.collection_url(&self.auth_collection, "auth-with-password");
        debug!(url = %url, "authenticating with data store");

        let response = self
            .http_client
            .post(&url)
            .json(&json!({ "identity": identity, "password": password }))
            .send()
            .await?;

        let auth: AuthResponse = check_status(response).await?.json().await?;
        Ok(auth.token)
    }

    async fn create_message(&self, token: &str, message: &NewMessage) -> Result<MessageRecord> {
        let url = self.collection_url(MESSAGES_COLLECTION, "records");

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, token)
            .json(message)
            .send()
            .await?;

        let record: MessageRecord = check_status(response).await?.json().await?;
        debug!(message_id = %record.id, "message record created");
        Ok(record)
    }

    async fn update_heating_state(
        &self,
        token: &str,
        zone: Zone,
        state: &HeatingState,
    ) -> Result<()> {
        let url = self.collection_url(
            HEATING_STATE_COLLECTION,
            &format!("records/{}", zone.storage_key()),
        );

        let response = self
            .http_client
            .patch(&url)
            .header(AUTHORIZATION, token)
            .json(state)
            .send()
            .await?;

        check_status(response).await?;
        debug!(zone = %zone, "heating state updated");
        Ok(())
    }
}
