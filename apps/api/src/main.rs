mod classifier;
mod config;
mod errors;
mod routes;
mod state;
mod tracking;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classifier::HttpFrameClassifier;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tracking::registry::SessionRegistry;

/// Sweep interval for the idle-session evictor, when a TTL is configured.
const SWEEP_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Proctor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the frame classifier client
    let classifier = Arc::new(HttpFrameClassifier::new(
        config.classifier_url.clone(),
        config.classifier_timeout_ms,
    ));
    info!(
        "Frame classifier initialized (sidecar: {}, timeout: {}ms)",
        config.classifier_url, config.classifier_timeout_ms
    );

    // Initialize the session registry
    let registry = Arc::new(SessionRegistry::new(config.session_ttl_secs));
    match config.session_ttl_secs {
        Some(ttl) => info!("Session registry initialized (idle TTL: {ttl}s)"),
        None => info!("Session registry initialized (no eviction)"),
    }

    // Background sweeper for idle sessions, only when a TTL is configured
    if config.session_ttl_secs.is_some() {
        let sweeper_registry = registry.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                let evicted = sweeper_registry.evict_idle(Utc::now()).await;
                if evicted > 0 {
                    info!("Evicted {evicted} idle session(s)");
                }
            }
        });
    }

    // Build app state
    let state = AppState {
        registry,
        classifier,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
