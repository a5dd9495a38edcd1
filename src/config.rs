use config::ConfigError;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::auth::{Credentials, RetryPolicy};

pub const DEFAULT_POCKETBASE_URL: &str = "http://pocketbase:8095";
pub const DEFAULT_PORT: u16 = 3038;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pocketbase: PocketBaseConfig,
    pub webhook: WebhookConfig,
    pub retry: RetryConfig,
    pub tls: TlsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Deserialize)]
pub struct PocketBaseConfig {
    pub url: String,
    pub auth_collection: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for PocketBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketBaseConfig")
            .field("url", &self.url)
            .field("auth_collection", &self.auth_collection)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Only SMS from this number are accepted when set
    pub allowed_phone_number: Option<String>,
    /// Answer 403 until the first successful authentication
    pub require_auth_session: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct TlsConfig {
    pub enabled: bool,
    /// Base64-encoded PEM private key
    pub key: Option<String>,
    /// Base64-encoded PEM certificate chain
    pub cert: Option<String>,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("enabled", &self.enabled)
            .field("key", &self.key.as_ref().map(|_| "***"))
            .field("cert", &self.cert.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from defaults overridden by `lookup(VAR)`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config: Config = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("pocketbase.url", DEFAULT_POCKETBASE_URL)?
            .set_default("pocketbase.auth_collection", "users")?
            .set_default("webhook.require_auth_session", false)?
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.delay_secs", 5)?
            .set_default("tls.enabled", false)?
            .set_override_option("server.host", lookup("HOST"))?
            .set_override_option("server.port", lookup("PORT"))?
            .set_override_option("pocketbase.url", lookup("PB_URL"))?
            .set_override_option("pocketbase.auth_collection", lookup("PB_AUTH_COLLECTION"))?
            .set_override_option("pocketbase.username", lookup("PB_USERNAME"))?
            .set_override_option("pocketbase.password", lookup("PB_PASSWORD"))?
            .set_override_option(
                "webhook.allowed_phone_number",
                lookup("ALLOWED_PHONE_NUMBER").filter(|v| !v.is_empty()),
            )?
            .set_override_option("webhook.require_auth_session", lookup("REQUIRE_AUTH_SESSION"))?
            .set_override_option("retry.max_attempts", lookup("RETRY_MAX_ATTEMPTS"))?
            .set_override_option("retry.delay_secs", lookup("RETRY_DELAY_SECS"))?
            .set_override_option("tls.enabled", lookup("TLS_ENABLED"))?
            .set_override_option("tls.key", lookup("TLS_KEY"))?
            .set_override_option("tls.cert", lookup("TLS_CERT"))?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pocketbase.username.is_empty() || self.pocketbase.password.is_empty() {
            return Err(ConfigError::Message(
                "PB_USERNAME and PB_PASSWORD must be set".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Message(
                "RETRY_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.tls.enabled {
            let missing = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);
            if missing(&self.tls.key) || missing(&self.tls.cert) {
                return Err(ConfigError::Message(
                    "TLS_KEY and TLS_CERT must be set when TLS is enabled".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            identity: self.pocketbase.username.clone(),
            password: self.pocketbase.password.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_secs(self.retry.delay_secs),
        )
    }
}
