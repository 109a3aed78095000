//! Routing gateway seam: the external service that resolves one leg.

use std::future::Future;

use crate::error::RouteError;
use crate::models::{LegRoute, Point, Profile};

/// Resolves the routed path between two points under a profile.
///
/// Implementations report transport problems as [`RouteError::FetchFailure`]
/// and "no route found" as [`RouteError::EmptyResult`]; the engine treats both
/// the same way.
pub trait RoutingGateway: Send + Sync + 'static {
    fn fetch_leg(
        &self,
        start: Point,
        end: Point,
        profile: Profile,
    ) -> impl Future<Output = Result<LegRoute, RouteError>> + Send;
}
