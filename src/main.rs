use sms_heating_webhook::{
    api::{create_router, AppState},
    auth::SessionManager,
    repositories::PocketBaseClient,
    services::SmsService,
    tls, Config,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sms_heating_webhook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sms-heating-webhook");
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Failed to read .env file: {}", e);
        }
    }

    // Load configuration
    let config = Config::from_env()?;
    info!(pocketbase = %config.pocketbase.url, "Configuration loaded");

    let store = Arc::new(PocketBaseClient::new(
        config.pocketbase.url.clone(),
        config.pocketbase.auth_collection.clone(),
    ));
    let session = SessionManager::new(store.clone(), config.credentials(), config.retry_policy());

    // Authenticate in the background; requests re-authenticate lazily if this fails
    let startup_session = session.clone();
    tokio::spawn(async move {
        if !startup_session.ensure_authenticated().await {
            warn!("Starting without a data store session");
        }
    });

    let app_state = AppState {
        service: SmsService::new(store, session),
        webhook: config.webhook.clone(),
    };
    let app = create_router(app_state);

    let addr: SocketAddr = config.bind_address().parse()?;

    if config.tls.enabled {
        let rustls = tls::rustls_config(&config.tls).await?;
        let handle = axum_server::Handle::new();

        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        info!("Webhook service listening on https://{}", addr);
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Webhook service listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    info!("Application shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
