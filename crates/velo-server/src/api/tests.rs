use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use velo_core::{EngineConfig, LegRoute, Point, Profile, RouteError, RouteStats, RoutingGateway};

use crate::{api, state::AppState};

/// Routes every leg through its midpoint; car routing is always down.
struct MidpointGateway;

impl RoutingGateway for MidpointGateway {
    async fn fetch_leg(&self, start: Point, end: Point, profile: Profile) -> Result<LegRoute, RouteError> {
        if profile == Profile::CarVario {
            return Err(RouteError::FetchFailure("connection refused".into()));
        }
        let mid = Point::new((start.lat + end.lat) / 2.0 + 0.5, (start.lng + end.lng) / 2.0);
        Ok(LegRoute {
            coordinates: vec![start, mid, end],
            stats: Some(RouteStats {
                distance_km: 5.0,
                ascent_m: 100.0,
                descent_m: 50.0,
                time_h: 0.5,
            }),
        })
    }
}

fn setup_app() -> (axum::Router, Arc<AppState<MidpointGateway>>) {
    let state = Arc::new(AppState::new(MidpointGateway, EngineConfig::default()));
    let app = api::routes().with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_route(app: &axum::Router, body: Value) -> Value {
    let res = app
        .clone()
        .oneshot(post_json("/v1/routes?wait=true", body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    read_json(res).await
}

#[tokio::test]
async fn lists_profiles() {
    let (app, _state) = setup_app();
    let res = app
        .oneshot(Request::builder().uri("/v1/profiles").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let profiles = body.as_array().unwrap();
    assert_eq!(profiles.len(), Profile::ALL.len());
    assert!(profiles.iter().any(|p| p["id"] == "fastbike-verylowtraffic"));
}

#[tokio::test]
async fn create_route_with_endpoints_resolves_legs() {
    let (app, state) = setup_app();
    let body = create_route(
        &app,
        json!({
            "profile": "trekking",
            "start": {"lat": 0.0, "lng": 0.0},
            "end": {"lat": 0.0, "lng": 4.0},
            "waypoints": [{"lat": 0.0, "lng": 2.0}]
        }),
    )
    .await;

    assert_eq!(body["profile"], "trekking");
    assert_eq!(body["state"], "idle");
    assert_eq!(body["segments"].as_array().unwrap().len(), 2);
    assert_eq!(body["path"].as_array().unwrap().len(), 5);
    assert_eq!(body["stats"]["distance_km"], 10.0);
    assert_eq!(body["stats"]["ascent_m"], 200.0);
    assert_eq!(state.session_count(), 1);
}

#[tokio::test]
async fn edits_update_the_route() {
    let (app, _state) = setup_app();
    let created = create_route(
        &app,
        json!({"start": {"lat": 0.0, "lng": 0.0}, "end": {"lat": 0.0, "lng": 2.0}}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/routes/{}/edits?wait=true", id),
            json!({"op": "swap"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["sequence"]["start"]["lng"], 2.0);
    assert_eq!(body["sequence"]["end"]["lng"], 0.0);
    assert_eq!(body["segments"][0]["status"], "resolved");
}

#[tokio::test]
async fn background_edit_reports_loading_legs() {
    let (app, _state) = setup_app();
    let created = create_route(
        &app,
        json!({"start": {"lat": 0.0, "lng": 0.0}, "end": {"lat": 0.0, "lng": 2.0}}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/routes/{}/edits", id),
            json!({"op": "set_end", "point": {"lat": 1.0, "lng": 3.0}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = read_json(res).await;
    assert_eq!(body["sequence"]["end"]["lat"], 1.0);
    assert_eq!(body["state"], "recomputing");
    assert_eq!(body["loading_segments"].as_array().unwrap().len(), 1);
    assert!(body["path"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_edit_is_unprocessable() {
    let (app, _state) = setup_app();
    let created = create_route(&app, json!({"start": {"lat": 0.0, "lng": 0.0}})).await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/routes/{}/edits", id),
            json!({"op": "remove_waypoint", "index": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn failed_legs_fall_back_to_straight_lines() {
    let (app, _state) = setup_app();
    let body = create_route(
        &app,
        json!({
            "profile": "car-vario",
            "start": {"lat": 0.0, "lng": 0.0},
            "end": {"lat": 0.0, "lng": 2.0}
        }),
    )
    .await;
    assert_eq!(body["segments"][0]["status"], "fallback");
    assert_eq!(body["path"].as_array().unwrap().len(), 2);
    assert!(body["stats"].is_null());
}

#[tokio::test]
async fn drag_on_path_inserts_waypoint() {
    let (app, _state) = setup_app();
    let created = create_route(
        &app,
        json!({"start": {"lat": 0.0, "lng": 0.0}, "end": {"lat": 0.0, "lng": 2.0}}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/routes/{}/drag?wait=true", id),
            json!({"pointer": {"lat": 0.6, "lng": 0.5}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["inserted"], true);
    assert_eq!(body["sequence"]["waypoints"].as_array().unwrap().len(), 1);
    assert_eq!(body["segments"].as_array().unwrap().len(), 2);

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/routes/{}/drag", id),
            json!({"pointer": {"lat": 0.0, "lng": 0.0}, "zoom": 14.0}),
        ))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["inserted"], false);
    assert_eq!(body["sequence"]["waypoints"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn map_clicks_build_a_route() {
    let (app, _state) = setup_app();
    let created = create_route(&app, json!({})).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/v1/routes/{}/events?wait=true", id);

    let res = app
        .clone()
        .oneshot(post_json(&uri, json!({"type": "click", "point": {"lat": 0.0, "lng": 0.0}})))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["command"]["op"], "set_start");
    assert_eq!(body["mode"]["editing"], true);

    let res = app
        .clone()
        .oneshot(post_json(&uri, json!({"type": "click", "point": {"lat": 0.0, "lng": 1.0}})))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["command"]["op"], "set_end");
    assert_eq!(body["mode"]["editing"], false);
    assert_eq!(body["segments"][0]["status"], "resolved");

    let res = app
        .clone()
        .oneshot(post_json(&uri, json!({"type": "click", "point": {"lat": 5.0, "lng": 5.0}})))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert!(body["command"].is_null());
    assert_eq!(body["sequence"]["end"]["lng"], 1.0);
}

#[tokio::test]
async fn path_drop_ends_the_drag_for_later_clicks() {
    let (app, _state) = setup_app();
    let created = create_route(&app, json!({})).await;
    let id = created["id"].as_str().unwrap();
    let events = format!("/v1/routes/{}/events?wait=true", id);

    for event in [
        json!({"type": "click", "point": {"lat": 0.0, "lng": 0.0}}),
        json!({"type": "click", "point": {"lat": 0.0, "lng": 2.0}}),
    ] {
        app.clone().oneshot(post_json(&events, event)).await.unwrap();
    }
    let res = app
        .clone()
        .oneshot(post_json(&events, json!({"type": "drag_started"})))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["mode"]["dragging"], true);

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/routes/{}/drag?wait=true", id),
            json!({"pointer": {"lat": 0.6, "lng": 0.5}}),
        ))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["inserted"], true);

    let res = app
        .clone()
        .oneshot(post_json(&events, json!({"type": "toggle_edit"})))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["command"]["op"], "clear");

    let res = app
        .clone()
        .oneshot(post_json(&events, json!({"type": "click", "point": {"lat": 3.0, "lng": 3.0}})))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["command"]["op"], "set_start");
    assert_eq!(body["mode"]["dragging"], false);
}

#[tokio::test]
async fn out_of_range_points_are_bad_requests() {
    let (app, state) = setup_app();
    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/routes",
            json!({"start": {"lat": 95.0, "lng": 0.0}, "end": {"lat": 0.0, "lng": 1.0}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.session_count(), 0);

    let created = create_route(
        &app,
        json!({"start": {"lat": 0.0, "lng": 0.0}, "end": {"lat": 0.0, "lng": 2.0}}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let requests = [
        ("edits", json!({"op": "set_start", "point": {"lat": 95.0, "lng": 0.0}})),
        ("events", json!({"type": "click", "point": {"lat": 0.0, "lng": 200.0}})),
        ("drag", json!({"pointer": {"lat": -91.0, "lng": 1.0}})),
    ];
    for (path, body) in requests {
        let res = app
            .clone()
            .oneshot(post_json(&format!("/v1/routes/{}/{}", id, path), body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);
    }

    let res = app
        .clone()
        .oneshot(Request::builder().uri(format!("/v1/routes/{}", id)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["sequence"]["start"]["lat"], 0.0);
    assert!(body["sequence"]["waypoints"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_and_deleted_routes_are_not_found() {
    let (app, _state) = setup_app();
    let res = app
        .clone()
        .oneshot(Request::builder().uri("/v1/routes/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let created = create_route(&app, json!({})).await;
    let id = created["id"].as_str().unwrap();
    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/routes/{}", id))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(delete).await.unwrap().status(), StatusCode::NO_CONTENT);

    let res = app
        .clone()
        .oneshot(Request::builder().uri(format!("/v1/routes/{}", id)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
