//! Core data models for the route segment engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::geometry::{round_micro_deg, segment_key};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates agree to 6 decimal places.
    pub fn same_place(&self, other: &Point) -> bool {
        round_micro_deg(self.lat) == round_micro_deg(other.lat)
            && round_micro_deg(self.lng) == round_micro_deg(other.lng)
    }

    /// Finite, with |lat| <= 90 and |lng| <= 180.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.lat.abs() <= 90.0 && self.lng.abs() <= 180.0
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid point '{0}', expected 'lat,lng'")]
pub struct ParsePointError(pub String);

impl FromStr for Point {
    type Err = ParsePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePointError(s.to_string());
        let (lat, lng) = s.split_once(',').ok_or_else(err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        let lng: f64 = lng.trim().parse().map_err(|_| err())?;
        let point = Point::new(lat, lng);
        if !point.is_valid() {
            return Err(err());
        }
        Ok(point)
    }
}

/// Ordered waypoint sequence: start, interior waypoints, end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointSequence {
    pub start: Option<Point>,
    #[serde(default)]
    pub waypoints: Vec<Point>,
    pub end: Option<Point>,
}

impl WaypointSequence {
    /// Both endpoints set.
    pub fn has_route(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// The logical order `[start, waypoints.., end]`, skipping unset endpoints.
    pub fn logical(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.waypoints.len() + 2);
        points.extend(self.start);
        points.extend(self.waypoints.iter().copied());
        points.extend(self.end);
        points
    }

    /// Consecutive pairs of the logical order. Empty unless a route exists.
    pub fn legs(&self) -> Vec<(Point, Point)> {
        if !self.has_route() {
            return Vec::new();
        }
        self.logical().windows(2).map(|w| (w[0], w[1])).collect()
    }

    pub fn leg_count(&self) -> usize {
        if self.has_route() {
            self.waypoints.len() + 1
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.waypoints.is_empty()
    }
}

/// Aggregated (or per-leg) route statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    pub distance_km: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
    pub time_h: f64,
}

impl Add for RouteStats {
    type Output = RouteStats;

    fn add(self, rhs: RouteStats) -> RouteStats {
        RouteStats {
            distance_km: self.distance_km + rhs.distance_km,
            ascent_m: self.ascent_m + rhs.ascent_m,
            descent_m: self.descent_m + rhs.descent_m,
            time_h: self.time_h + rhs.time_h,
        }
    }
}

impl AddAssign for RouteStats {
    fn add_assign(&mut self, rhs: RouteStats) {
        *self = *self + rhs;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    /// Fetch in flight; the renderer hides this leg.
    Loading,
    /// Routed polyline and stats from the gateway.
    Resolved,
    /// Straight line after a failed or empty fetch.
    Fallback,
}

/// One leg of the route, keyed by its rounded endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub start: Point,
    pub end: Point,
    pub coordinates: Vec<Point>,
    pub status: SegmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RouteStats>,
}

impl Segment {
    pub fn loading(start: Point, end: Point) -> Self {
        Self {
            id: segment_key(start, end),
            start,
            end,
            coordinates: Vec::new(),
            status: SegmentStatus::Loading,
            stats: None,
        }
    }

    pub fn resolved(start: Point, end: Point, coordinates: Vec<Point>, stats: Option<RouteStats>) -> Self {
        Self {
            id: segment_key(start, end),
            start,
            end,
            coordinates,
            status: SegmentStatus::Resolved,
            stats,
        }
    }

    pub fn fallback(start: Point, end: Point) -> Self {
        Self {
            id: segment_key(start, end),
            start,
            end,
            coordinates: vec![start, end],
            status: SegmentStatus::Fallback,
            stats: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == SegmentStatus::Loading
    }
}

/// Placeholder for a leg in flight, drawn as an animated straight line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadingSegment {
    pub start: Point,
    pub end: Point,
}

/// Routed geometry for one leg as returned by a routing gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegRoute {
    pub coordinates: Vec<Point>,
    pub stats: Option<RouteStats>,
}

/// Routing profiles understood by the routing service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "gravel")]
    Gravel,
    #[default]
    #[serde(rename = "mtb")]
    Mtb,
    #[serde(rename = "trekking")]
    Trekking,
    #[serde(rename = "fastbike")]
    Fastbike,
    #[serde(rename = "fastbike-verylowtraffic")]
    FastbikeLowTraffic,
    #[serde(rename = "car-vario")]
    CarVario,
    #[serde(rename = "moped")]
    Moped,
    #[serde(rename = "hiking-mountain")]
    HikingMountain,
    #[serde(rename = "vm-forum-liegerad-schnell")]
    Recumbent,
    #[serde(rename = "vm-forum-velomobil-schnell")]
    Velomobile,
    #[serde(rename = "shortest")]
    Shortest,
}

impl Profile {
    pub const ALL: [Profile; 11] = [
        Profile::Gravel,
        Profile::Mtb,
        Profile::Trekking,
        Profile::Fastbike,
        Profile::FastbikeLowTraffic,
        Profile::CarVario,
        Profile::Moped,
        Profile::HikingMountain,
        Profile::Recumbent,
        Profile::Velomobile,
        Profile::Shortest,
    ];

    /// Identifier passed to the routing service.
    pub fn id(&self) -> &'static str {
        match self {
            Profile::Gravel => "gravel",
            Profile::Mtb => "mtb",
            Profile::Trekking => "trekking",
            Profile::Fastbike => "fastbike",
            Profile::FastbikeLowTraffic => "fastbike-verylowtraffic",
            Profile::CarVario => "car-vario",
            Profile::Moped => "moped",
            Profile::HikingMountain => "hiking-mountain",
            Profile::Recumbent => "vm-forum-liegerad-schnell",
            Profile::Velomobile => "vm-forum-velomobil-schnell",
            Profile::Shortest => "shortest",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Gravel => "Gravel",
            Profile::Mtb => "MTB",
            Profile::Trekking => "Trekking",
            Profile::Fastbike => "Fast Bike",
            Profile::FastbikeLowTraffic => "Fast Bike (Low Traffic)",
            Profile::CarVario => "Car",
            Profile::Moped => "Moped",
            Profile::HikingMountain => "Hiking (Mountain)",
            Profile::Recumbent => "Recumbent Bike",
            Profile::Velomobile => "Velomobile",
            Profile::Shortest => "Shortest",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Profile::Gravel => "Gravel bike routing",
            Profile::Mtb => "Mountain Bike - Off-road cycling",
            Profile::Trekking => "Trekking bicycle routing",
            Profile::Fastbike => "Fast bicycle routing",
            Profile::FastbikeLowTraffic => "Fast bicycle with very low traffic preference",
            Profile::CarVario => "Variable car routing",
            Profile::Moped => "Moped/scooter routing",
            Profile::HikingMountain => "Mountain hiking routes",
            Profile::Recumbent => "Fast recumbent bicycle routing",
            Profile::Velomobile => "Fast velomobile routing",
            Profile::Shortest => "Shortest distance routing",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown routing profile '{0}'")]
pub struct UnknownProfile(pub String);

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Profile::ALL
            .iter()
            .copied()
            .find(|profile| profile.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}
