//! REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use velo_core::{
    EditCommand, Equirectangular, InteractionMode, MapEvent, Point, Profile, RecomputeBatch,
    RouteEditor, RouteError, RouteSnapshot, RoutingGateway, WebMercator,
};

use crate::state::AppState;

type ApiError = (StatusCode, Json<Value>);

/// Create the API router.
pub fn create_router<G: RoutingGateway>() -> Router<Arc<AppState<G>>> {
    Router::new()
        .route("/v1/profiles", get(list_profiles))
        .route("/v1/routes", post(create_route::<G>))
        .route("/v1/routes/:id", get(get_route::<G>).delete(delete_route::<G>))
        .route("/v1/routes/:id/edits", post(apply_edit::<G>))
        .route("/v1/routes/:id/drag", post(drag_path::<G>))
        .route("/v1/routes/:id/events", post(map_event::<G>))
}

#[derive(Debug, Serialize)]
pub struct ProfileInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Optional initial route; points are applied start, end, then waypoints.
#[derive(Debug, Default, Deserialize)]
pub struct CreateRouteRequest {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub start: Option<Point>,
    #[serde(default)]
    pub end: Option<Point>,
    #[serde(default)]
    pub waypoints: Vec<Point>,
}

#[derive(Debug, Serialize)]
pub struct RouteView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub route: RouteSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct DragRequest {
    pub pointer: Point,
    /// Map zoom at release; hit-testing uses screen pixels when present.
    #[serde(default)]
    pub zoom: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DragResponse {
    pub inserted: bool,
    #[serde(flatten)]
    pub route: RouteView,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub command: Option<EditCommand>,
    pub mode: InteractionMode,
    #[serde(flatten)]
    pub route: RouteView,
}

/// `?wait=true` answers after every leg of the edit has settled.
#[derive(Debug, Default, Deserialize)]
pub struct WaitQuery {
    #[serde(default)]
    pub wait: bool,
}

fn not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found", "id": id })),
    )
}

fn rejected(err: RouteError) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": err.to_string() })),
    )
}

fn invalid_point(point: Point) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Point out of range", "lat": point.lat, "lng": point.lng })),
    )
}

/// Reject the first point that is not a valid coordinate.
fn check_points(points: impl IntoIterator<Item = Point>) -> Result<(), ApiError> {
    match points.into_iter().find(|p| !p.is_valid()) {
        Some(point) => Err(invalid_point(point)),
        None => Ok(()),
    }
}

fn view<G: RoutingGateway>(id: String, created_at: DateTime<Utc>, editor: &RouteEditor<G>) -> RouteView {
    RouteView {
        id,
        created_at,
        route: editor.snapshot(),
    }
}

/// Run `batch` inline or in the background. Returns whether legs are still in flight.
async fn settle<G: RoutingGateway>(editor: &RouteEditor<G>, batch: RecomputeBatch, wait: bool) -> bool {
    if batch.is_empty() {
        return false;
    }
    if wait {
        editor.run(batch).await;
        return false;
    }
    let editor = editor.clone();
    tokio::spawn(async move {
        editor.run(batch).await;
    });
    true
}

fn edit_status(pending: bool) -> StatusCode {
    if pending {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    }
}

/// List routing profiles.
async fn list_profiles() -> Json<Vec<ProfileInfo>> {
    Json(
        Profile::ALL
            .iter()
            .map(|p| ProfileInfo {
                id: p.id(),
                name: p.name(),
                description: p.description(),
            })
            .collect(),
    )
}

/// Open a route session.
async fn create_route<G: RoutingGateway>(
    State(state): State<Arc<AppState<G>>>,
    Query(query): Query<WaitQuery>,
    body: Option<Json<CreateRouteRequest>>,
) -> Result<(StatusCode, Json<RouteView>), ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    check_points(req.start.into_iter().chain(req.end).chain(req.waypoints.iter().copied()))?;
    let (id, created_at, editor) = state.create_session();

    let mut commands = Vec::new();
    if let Some(profile) = req.profile {
        commands.push(EditCommand::SetProfile { profile });
    }
    if let Some(point) = req.start {
        commands.push(EditCommand::SetStart { point });
    }
    if let Some(point) = req.end {
        commands.push(EditCommand::SetEnd { point });
    }
    commands.extend(
        req.waypoints
            .into_iter()
            .map(|point| EditCommand::InsertWaypoint { point, index: None }),
    );

    // The last non-empty batch reissues every leg.
    let mut batch = RecomputeBatch::default();
    for command in commands {
        match editor.try_submit(command) {
            Ok(next) if !next.is_empty() => batch = next,
            Ok(_) => {}
            Err(err) => {
                state.remove_session(&id);
                return Err(rejected(err));
            }
        }
    }
    settle(&editor, batch, query.wait).await;

    tracing::info!("Created route session {}", id);
    Ok((StatusCode::CREATED, Json(view(id, created_at, &editor))))
}

/// Current route of a session.
async fn get_route<G: RoutingGateway>(
    State(state): State<Arc<AppState<G>>>,
    Path(id): Path<String>,
) -> Result<Json<RouteView>, ApiError> {
    let (created_at, editor) = state.editor(&id).ok_or_else(|| not_found(&id))?;
    Ok(Json(view(id, created_at, &editor)))
}

/// Close a session.
async fn delete_route<G: RoutingGateway>(
    State(state): State<Arc<AppState<G>>>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.remove_session(&id) {
        tracing::info!("Closed route session {}", id);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Apply one edit command.
async fn apply_edit<G: RoutingGateway>(
    State(state): State<Arc<AppState<G>>>,
    Path(id): Path<String>,
    Query(query): Query<WaitQuery>,
    Json(command): Json<EditCommand>,
) -> Result<(StatusCode, Json<RouteView>), ApiError> {
    check_points(command.point())?;
    let (created_at, editor) = state.editor(&id).ok_or_else(|| not_found(&id))?;
    let batch = editor.try_submit(command).map_err(rejected)?;
    let pending = settle(&editor, batch, query.wait).await;
    Ok((edit_status(pending), Json(view(id, created_at, &editor))))
}

/// Insert a waypoint where a drag over the drawn path was released. Ends the
/// session's drag either way.
async fn drag_path<G: RoutingGateway>(
    State(state): State<Arc<AppState<G>>>,
    Path(id): Path<String>,
    Query(query): Query<WaitQuery>,
    Json(req): Json<DragRequest>,
) -> Result<(StatusCode, Json<DragResponse>), ApiError> {
    check_points([req.pointer])?;
    let (created_at, editor) = state.finish_path_drag(&id).ok_or_else(|| not_found(&id))?;
    let batch = match req.zoom {
        Some(zoom) => editor.drag_insert(req.pointer, &WebMercator::new(zoom)),
        None => editor.drag_insert(req.pointer, &Equirectangular),
    };

    let inserted = batch.is_some();
    let pending = match batch {
        Some(batch) => settle(&editor, batch, query.wait).await,
        None => false,
    };
    Ok((
        edit_status(pending),
        Json(DragResponse {
            inserted,
            route: view(id, created_at, &editor),
        }),
    ))
}

/// Feed a raw map event through the interaction dispatcher.
async fn map_event<G: RoutingGateway>(
    State(state): State<Arc<AppState<G>>>,
    Path(id): Path<String>,
    Query(query): Query<WaitQuery>,
    Json(event): Json<MapEvent>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    check_points(event.point())?;
    let (command, mode) = state
        .dispatch_event(&id, event)
        .ok_or_else(|| not_found(&id))?;
    let (created_at, editor) = state.editor(&id).ok_or_else(|| not_found(&id))?;

    let pending = match command {
        Some(command) => settle(&editor, editor.submit(command), query.wait).await,
        None => false,
    };
    Ok((
        edit_status(pending),
        Json(EventResponse {
            command,
            mode,
            route: view(id, created_at, &editor),
        }),
    ))
}
