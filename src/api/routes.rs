use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Level;

use super::handlers::{health, webhook, AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/webhook/sms", post(webhook::receive_sms))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, RetryPolicy, SessionManager};
    use crate::config::WebhookConfig;
    use crate::repositories::pocketbase::MockDataStore;
    use crate::services::SmsService;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn router(store: MockDataStore, webhook: WebhookConfig) -> Router {
        let store: Arc<dyn crate::repositories::DataStore> = Arc::new(store);
        let session = SessionManager::new(
            store.clone(),
            Credentials {
                identity: "svc".into(),
                password: "pw".into(),
            },
            RetryPolicy::new(3, Duration::ZERO),
        );

        create_router(AppState {
            service: SmsService::new(store, session),
            webhook,
        })
    }

    fn post_json(body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/webhook/sms")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_unauthenticated() {
        let app = router(MockDataStore::new(), WebhookConfig::default());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "status": "ok", "authenticated": false })
        );
    }

    #[tokio::test]
    async fn test_wrong_event_never_touches_store() {
        // No expectations: any data store call panics
        let app = router(MockDataStore::new(), WebhookConfig::default());

        let response = app
            .oneshot(post_json(json!({
                "event": "sms:sent",
                "payload": { "message": "Hovedenhet: PÅ 21C", "phoneNumber": "+47", "receivedAt": "now" }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Invalid event type" })
        );
    }

    #[tokio::test]
    async fn test_require_auth_session_answers_forbidden() {
        let app = router(
            MockDataStore::new(),
            WebhookConfig {
                allowed_phone_number: None,
                require_auth_session: true,
            },
        );

        let response = app
            .oneshot(post_json(json!({ "event": "sms:received" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_payload_is_bad_request() {
        let app = router(MockDataStore::new(), WebhookConfig::default());

        let response = app
            .oneshot(post_json(json!({ "event": "sms:received" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_answers_error_body() {
        let app = router(MockDataStore::new(), WebhookConfig::default());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/webhook/sms")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"event\": "))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_event_ignores_payload_shape() {
        let app = router(MockDataStore::new(), WebhookConfig::default());

        let response = app
            .oneshot(post_json(json!({
                "event": "other",
                "payload": { "message": "x" }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Invalid event type" })
        );
    }
}
