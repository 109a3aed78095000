//! API routes for the Velo server.

mod routes;

use axum::Router;
use std::sync::Arc;
use velo_core::RoutingGateway;

use crate::state::AppState;

pub use routes::{CreateRouteRequest, DragRequest, EventResponse, ProfileInfo, RouteView};

pub fn routes<G: RoutingGateway>() -> Router<Arc<AppState<G>>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
