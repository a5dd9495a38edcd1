use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::RetryPolicy;
use crate::error::{AppError, Result};
use crate::repositories::DataStore;

#[derive(Clone)]
pub struct Credentials {
    pub identity: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("password", &"***")
            .finish()
    }
}

/// Holds the service-account session against the data store.
///
/// Cloning is cheap; all clones share the same token.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn DataStore>,
    credentials: Credentials,
    policy: RetryPolicy,
    token: Arc<RwLock<Option<String>>>,
    has_authenticated: Arc<AtomicBool>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DataStore>, credentials: Credentials, policy: RetryPolicy) -> Self {
        Self {
            store,
            credentials,
            policy,
            token: Arc::new(RwLock::new(None)),
            has_authenticated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a session token is cached.
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// True once any credential exchange has succeeded in this process.
    pub fn has_authenticated(&self) -> bool {
        self.has_authenticated.load(Ordering::SeqCst)
    }

    /// Makes sure a session token is cached, exchanging credentials if needed.
    ///
    /// Returns false when every attempt failed; the manager stays unauthenticated
    /// and the next call tries again.
    pub async fn ensure_authenticated(&self) -> bool {
        self.session_token().await.is_some()
    }

    /// Runs `op` with a valid session token, retrying on failure.
    ///
    /// A failed attempt discards the token it used so the next attempt
    /// re-authenticates. The last error is returned once attempts are exhausted.
    pub async fn with_retry<T, Op, Fut>(&self, what: &str, op: Op) -> Result<T>
    where
        Op: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let op = &op;

        self.policy
            .run(what, move |_| async move {
                let token = self.session_token().await.ok_or_else(|| {
                    AppError::Auth("No session with the data store".to_string())
                })?;

                match op(token.clone()).await {
                    Ok(value) => Ok(value),
                    Err(e) => {
                        self.discard(&token).await;
                        Err(e)
                    }
                }
            })
            .await
    }

    async fn session_token(&self) -> Option<String> {
        if let Some(token) = self.token.read().await.clone() {
            return Some(token);
        }

        let result = self
            .policy
            .run("authenticate", move |_| {
                self.store
                    .authenticate(&self.credentials.identity, &self.credentials.password)
            })
            .await;

        match result {
            Ok(token) => {
                *self.token.write().await = Some(token.clone());
                self.has_authenticated.store(true, Ordering::SeqCst);
                info!(identity = %self.credentials.identity, "Authenticated successfully with data store");
                Some(token)
            }
            Err(e) => {
                error!(error = %e, "Error authenticating with data store");
                None
            }
        }
    }

    /// Clears the cached token only if it is still the one that failed, so a
    /// token freshly obtained by a concurrent request survives.
    async fn discard(&self, failed: &str) {
        let mut token = self.token.write().await;
        if token.as_deref() == Some(failed) {
            *token = None;
        }
    }
}
