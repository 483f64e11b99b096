mod config;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use hearth_api::auth::{AppState, AppStateInner};
use hearth_db::Database;
use hearth_engine::{Engine, EngineConfig, Notifier};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    let notifier = Notifier::new();
    let engine = Engine::new(
        db.clone(),
        notifier.clone(),
        EngineConfig {
            cascade_workers: config.cascade_workers,
            ..EngineConfig::default()
        },
    );

    tokio::spawn(relay_notices(notifier));

    let state: AppState = Arc::new(AppStateInner {
        db,
        engine,
        jwt_secret: config.jwt_secret.clone(),
        request_timeout: config.request_timeout,
    });

    let app = hearth_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Hearth server listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Hearth server stopped");
    Ok(())
}

/// Forward committed facts to the log until the engine goes away.
async fn relay_notices(notifier: Notifier) {
    let mut rx = notifier.subscribe();
    drop(notifier);
    loop {
        match rx.recv().await {
            Ok(notice) => match notice.recipient() {
                Some(recipient) => info!(recipient, ?notice, "notice"),
                None => info!(?notice, "notice"),
            },
            Err(RecvError::Lagged(missed)) => warn!(missed, "notice relay fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
