//! BRouter GeoJSON response parsing.

use serde::Deserialize;
use serde_json::{Map, Value};
use velo_core::{LegRoute, Point, RouteError, RouteStats};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// `[lng, lat]` or `[lng, lat, elevation]`.
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

/// Parse a `format=geojson` body into the first feature's polyline and stats.
///
/// A collection without features or coordinates is [`RouteError::EmptyResult`];
/// a body that is not a feature collection is a [`RouteError::FetchFailure`].
pub fn parse_route_response(body: &[u8]) -> Result<LegRoute, RouteError> {
    let collection: FeatureCollection = serde_json::from_slice(body)
        .map_err(|e| RouteError::FetchFailure(format!("malformed route response: {}", e)))?;

    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(RouteError::EmptyResult)?;

    let coordinates: Vec<Point> = feature
        .geometry
        .map(|g| g.coordinates)
        .unwrap_or_default()
        .into_iter()
        .filter(|c| c.len() >= 2)
        .map(|c| Point::new(c[1], c[0]))
        .collect();
    if coordinates.is_empty() {
        return Err(RouteError::EmptyResult);
    }

    Ok(LegRoute {
        coordinates,
        stats: feature.properties.as_ref().map(stats_from_properties),
    })
}

/// Route statistics from BRouter feature properties.
///
/// Ascent prefers the filtered value and falls back to `plain-ascend`; only a
/// negative `plain-ascend` contributes descent.
fn stats_from_properties(props: &Map<String, Value>) -> RouteStats {
    let plain_ascend = number(props, "plain-ascend");
    let filtered_ascend = number(props, "filtered ascend");
    let ascent = if filtered_ascend > 0.0 { filtered_ascend } else { plain_ascend };

    RouteStats {
        distance_km: number(props, "track-length") / 1000.0,
        ascent_m: ascent.max(0.0),
        descent_m: plain_ascend.min(0.0).abs(),
        time_h: number(props, "total-time") / 3600.0,
    }
}

/// BRouter reports numbers as strings; accept either. Missing or garbled is 0.
fn number(props: &Map<String, Value>, key: &str) -> f64 {
    match props.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}
