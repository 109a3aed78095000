pub mod aggregate;
pub mod dispatch;
pub mod drag;
pub mod editor;
pub mod error;
pub mod gateway;
pub mod geometry;
pub mod models;
pub mod policy;
pub mod store;

pub use aggregate::{has_stats, loading_segments, merge_path, sum_stats};
pub use dispatch::{dispatch, InteractionMode, MapEvent};
pub use drag::{resolve_drag_insertion, DragInsertion};
pub use editor::{EditCommand, EngineConfig, RouteEditor};
pub use error::{InvalidEdit, Result, RouteError};
pub use gateway::RoutingGateway;
pub use geometry::{
    distance_point_to_segment, is_near_existing_point, nearest_point_on_polyline, segment_key,
    Equirectangular, PolylineHit, Projection, Vec2, WebMercator, DEFAULT_MAX_DRAG_DISTANCE,
    DEFAULT_NEAR_THRESHOLD_DEG,
};
pub use models::{
    LegRoute, LoadingSegment, ParsePointError, Point, Profile, RouteStats, Segment,
    SegmentStatus, UnknownProfile, WaypointSequence,
};
pub use policy::{plan, Edit, Recompute};
pub use store::{LegOutcome, LegRequest, RecomputeBatch, RecomputeState, RouteSnapshot, SegmentStore};
