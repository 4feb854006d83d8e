mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use inkpad_api::password::Hasher;
use inkpad_api::token::TokenIssuer;
use inkpad_api::{AppState, AppStateInner};
use inkpad_db::Database;

use crate::config::Config;

/// Wire the hasher, store and token issuer from config. Any failure here
/// is fatal at startup.
fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let hasher = Hasher::with_costs(config.hash_memory_kib, config.hash_iterations)
        .context("invalid password hashing parameters")?;

    let db = Database::open(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    Ok(Arc::new(AppStateInner {
        store: Arc::new(db),
        hasher,
        tokens: TokenIssuer::new(config.jwt_secret.as_bytes()),
    }))
}

fn load() -> anyhow::Result<(Config, AppState)> {
    let config = Config::from_env()?;
    let state = build_state(&config)?;
    Ok((config, state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "inkpad=debug,inkpad_api=debug,inkpad_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let (config, state) = match load() {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("FATAL: {:#}", e);
            std::process::exit(1);
        }
    };

    let app = inkpad_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("inkpad listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
