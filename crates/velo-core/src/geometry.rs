//! Planar geometry for interactive hit-testing and segment identity keys.
//!
//! Distances here are measured in projected-plane units (layer pixels or
//! degrees), never geodesic. Route statistics come from the routing service.

use crate::models::Point;
use std::f64::consts::PI;

/// Default radius, in degrees, inside which a new waypoint counts as a
/// duplicate of an existing point (roughly 11 m of latitude).
pub const DEFAULT_NEAR_THRESHOLD_DEG: f64 = 0.0001;

/// Default reach of a path drag, in layer pixels under [`WebMercator`].
pub const DEFAULT_MAX_DRAG_DISTANCE: f64 = 20.0;

const KEY_SCALE: f64 = 1_000_000.0;
const TILE_SIZE_PX: f64 = 256.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// A point in a projected plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Maps geographic points to the plane the pointer lives in, and back.
pub trait Projection {
    fn project(&self, point: Point) -> Vec2;
    fn unproject(&self, v: Vec2) -> Point;
}

/// Plate carrée on raw degrees: x = lng, y = lat.
#[derive(Debug, Clone, Copy, Default)]
pub struct Equirectangular;

impl Projection for Equirectangular {
    fn project(&self, point: Point) -> Vec2 {
        Vec2::new(point.lng, point.lat)
    }

    fn unproject(&self, v: Vec2) -> Point {
        Point::new(v.y, v.x)
    }
}

/// Spherical web mercator in tile-layer pixels at a zoom level.
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    pub zoom: f64,
}

impl WebMercator {
    pub fn new(zoom: f64) -> Self {
        Self { zoom }
    }

    fn scale(&self) -> f64 {
        TILE_SIZE_PX * 2f64.powf(self.zoom)
    }
}

impl Projection for WebMercator {
    fn project(&self, point: Point) -> Vec2 {
        let scale = self.scale();
        let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let x = (point.lng + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
        Vec2::new(x, y)
    }

    fn unproject(&self, v: Vec2) -> Point {
        let scale = self.scale();
        let lng = v.x / scale * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * v.y / scale);
        let lat = n.sinh().atan().to_degrees();
        Point::new(lat, lng)
    }
}

/// Closest location on `a`–`b` to `p`, with its clamped parameter along the segment.
fn project_onto_segment(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f64) {
    let sx = b.x - a.x;
    let sy = b.y - a.y;
    let seg_len_sq = sx * sx + sy * sy;

    if seg_len_sq == 0.0 {
        // Segment is a point
        return (a, 0.0);
    }

    // t = ((P-A) · (B-A)) / |B-A|²
    let t = (((p.x - a.x) * sx + (p.y - a.y) * sy) / seg_len_sq).clamp(0.0, 1.0);
    (Vec2::new(a.x + t * sx, a.y + t * sy), t)
}

/// Distance from `p` to the segment `a`–`b` in plane units.
pub fn distance_point_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let (closest, _) = project_onto_segment(p, a, b);
    let dx = p.x - closest.x;
    let dy = p.y - closest.y;
    (dx * dx + dy * dy).sqrt()
}

/// Result of projecting a point onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineHit {
    pub point: Point,
    /// Index `i` of the polyline segment `polyline[i]`–`polyline[i + 1]`.
    pub segment_index: usize,
    /// Distance in projected-plane units.
    pub distance: f64,
}

/// Project `p` onto `polyline`; the first segment with the minimum distance wins.
///
/// Returns `None` for an empty polyline. A single-point polyline yields that
/// point at index 0.
pub fn nearest_point_on_polyline<P: Projection>(
    p: Point,
    polyline: &[Point],
    projection: &P,
) -> Option<PolylineHit> {
    let first = polyline.first()?;
    let target = projection.project(p);

    if polyline.len() == 1 {
        let v = projection.project(*first);
        return Some(PolylineHit {
            point: *first,
            segment_index: 0,
            distance: ((target.x - v.x).powi(2) + (target.y - v.y).powi(2)).sqrt(),
        });
    }

    let mut best: Option<PolylineHit> = None;
    for (index, pair) in polyline.windows(2).enumerate() {
        let a = projection.project(pair[0]);
        let b = projection.project(pair[1]);
        let (closest, t) = project_onto_segment(target, a, b);
        let distance = ((target.x - closest.x).powi(2) + (target.y - closest.y).powi(2)).sqrt();

        if best.map_or(true, |hit| distance < hit.distance) {
            // Vertex hits return the vertex itself, not its unprojection.
            let point = if t == 0.0 {
                pair[0]
            } else if t == 1.0 {
                pair[1]
            } else {
                projection.unproject(closest)
            };
            best = Some(PolylineHit {
                point,
                segment_index: index,
                distance,
            });
        }
    }
    best
}

/// Whether `p` lies within `threshold_deg` (Euclidean, in degrees) of any existing point.
pub fn is_near_existing_point(p: Point, existing: &[Point], threshold_deg: f64) -> bool {
    existing.iter().any(|q| {
        let dlat = q.lat - p.lat;
        let dlng = q.lng - p.lng;
        (dlat * dlat + dlng * dlng).sqrt() < threshold_deg
    })
}

/// Coordinate rounded to 6 decimal places, as integer micro-degrees.
pub fn round_micro_deg(value: f64) -> i64 {
    (value * KEY_SCALE).round() as i64
}

/// Stable identity for the leg `a` → `b`.
pub fn segment_key(a: Point, b: Point) -> String {
    format!(
        "{}:{}>{}:{}",
        round_micro_deg(a.lat),
        round_micro_deg(a.lng),
        round_micro_deg(b.lat),
        round_micro_deg(b.lng)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distance_to_segment_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!(approx(distance_point_to_segment(Vec2::new(5.0, 3.0), a, b), 3.0));
        assert!(approx(distance_point_to_segment(Vec2::new(-4.0, 3.0), a, b), 5.0));
        assert!(approx(distance_point_to_segment(Vec2::new(13.0, 4.0), a, b), 5.0));
    }

    #[test]
    fn distance_to_degenerate_segment_is_point_distance() {
        let a = Vec2::new(1.0, 1.0);
        assert!(approx(distance_point_to_segment(Vec2::new(4.0, 5.0), a, a), 5.0));
    }

    #[test]
    fn point_on_polyline_projects_to_itself() {
        let line = [Point::new(0.0, 0.0), Point::new(0.0, 1.0), Point::new(1.0, 1.0)];
        let on_line = Point::new(0.5, 1.0);
        let hit = nearest_point_on_polyline(on_line, &line, &Equirectangular).unwrap();
        assert!(approx(hit.distance, 0.0));
        assert_eq!(hit.segment_index, 1);
        assert!(approx(hit.point.lat, 0.5));
        assert!(approx(hit.point.lng, 1.0));
    }

    #[test]
    fn nearest_point_prefers_first_segment_on_tie() {
        // The pointer is equidistant from both segments' shared vertex.
        let line = [Point::new(0.0, 0.0), Point::new(0.0, 1.0), Point::new(0.0, 2.0)];
        let hit = nearest_point_on_polyline(Point::new(1.0, 1.0), &line, &Equirectangular).unwrap();
        assert_eq!(hit.segment_index, 0);
        assert_eq!(hit.point, Point::new(0.0, 1.0));
        assert!(approx(hit.distance, 1.0));
    }

    #[test]
    fn nearest_point_projects_perpendicular() {
        let line = [Point::new(0.0, 0.0), Point::new(0.0, 2.0)];
        let hit = nearest_point_on_polyline(Point::new(0.3, 1.5), &line, &Equirectangular).unwrap();
        assert_eq!(hit.segment_index, 0);
        assert!(approx(hit.point.lat, 0.0));
        assert!(approx(hit.point.lng, 1.5));
        assert!(approx(hit.distance, 0.3));
    }

    #[test]
    fn nearest_point_handles_short_polylines() {
        assert!(nearest_point_on_polyline(Point::new(0.0, 0.0), &[], &Equirectangular).is_none());
        let single = [Point::new(1.0, 1.0)];
        let hit = nearest_point_on_polyline(Point::new(1.0, 2.0), &single, &Equirectangular).unwrap();
        assert_eq!(hit.point, single[0]);
        assert_eq!(hit.segment_index, 0);
        assert!(approx(hit.distance, 1.0));
    }

    #[test]
    fn web_mercator_round_trips() {
        let projection = WebMercator::new(12.0);
        let p = Point::new(48.7758, 9.1829);
        let back = projection.unproject(projection.project(p));
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lng - p.lng).abs() < 1e-9);
    }

    #[test]
    fn web_mercator_hit_on_vertex_keeps_coordinates() {
        let projection = WebMercator::new(14.0);
        let line = [Point::new(48.77, 9.18), Point::new(48.78, 9.19), Point::new(48.79, 9.18)];
        let hit = nearest_point_on_polyline(line[1], &line, &projection).unwrap();
        assert_eq!(hit.point, line[1]);
        assert!(hit.distance < 1e-6);
    }

    #[test]
    fn near_existing_point_uses_strict_threshold() {
        let existing = [Point::new(10.0, 10.0)];
        assert!(is_near_existing_point(Point::new(10.00005, 10.0), &existing, DEFAULT_NEAR_THRESHOLD_DEG));
        assert!(!is_near_existing_point(Point::new(10.001, 10.0), &existing, DEFAULT_NEAR_THRESHOLD_DEG));
        assert!(!is_near_existing_point(Point::new(10.0, 10.0), &[], DEFAULT_NEAR_THRESHOLD_DEG));
    }

    #[test]
    fn segment_key_is_stable_under_rounding() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 2.0);
        assert_eq!(segment_key(a, b), "0:0>0:2000000");
        assert_eq!(segment_key(Point::new(-0.0, 0.000_000_1), b), segment_key(a, b));
        assert_ne!(segment_key(a, b), segment_key(b, a));
    }
}
