//! Velo Server - HTTP adapter for the route segment engine

use anyhow::{Context, Result};
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use velo_brouter::BRouterClient;
use velo_server::config::Config;
use velo_server::state::AppState;
use velo_server::{api, loops};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("velo_server=debug".parse()?)
            .add_directive("velo_core=info".parse()?))
        .init();

    tracing::info!("Starting Velo Server...");

    let config = Config::from_env();
    let brouter = BRouterClient::new(&config.brouter_url, config.brouter_timeout())
        .context("Failed to create BRouter client")?;
    tracing::info!(
        "Routing via {} (default profile {})",
        brouter.base_url(),
        config.default_profile
    );
    let state: Arc<AppState<BRouterClient>> = Arc::new(AppState::new(brouter, config.engine()));

    let (shutdown_tx, _) = broadcast::channel(1);
    tokio::spawn(loops::session_sweep_loop::run_session_sweep_loop(
        state.clone(),
        config.clone(),
        shutdown_tx.subscribe(),
    ));

    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        })
        .await?;

    Ok(())
}
