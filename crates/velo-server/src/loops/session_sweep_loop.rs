//! Periodic sweep of idle route sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;
use velo_core::RoutingGateway;

use crate::config::Config;
use crate::state::AppState;

/// Start the session sweep loop.
pub async fn run_session_sweep_loop<G: RoutingGateway>(
    state: Arc<AppState<G>>,
    config: Config,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(Duration::from_secs(config.session_sweep_interval_s));
    let max_idle = config.session_ttl();

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Session sweep loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let removed = state.prune_sessions(config.max_sessions, max_idle);
                if removed > 0 {
                    tracing::info!(
                        "Dropped {} idle route session(s), {} active",
                        removed,
                        state.session_count()
                    );
                }
            }
        }
    }
}
