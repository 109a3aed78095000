//! Human-readable route statistics.

use std::fmt::Write;

use velo_core::{LegOutcome, RouteSnapshot, RouteStats, SegmentStatus};

pub fn format_distance(km: f64) -> String {
    format!("{:.1} km", km)
}

pub fn format_elevation(m: f64) -> String {
    format!("{} m", m.round() as i64)
}

/// `H:MM h`, minutes rounded.
pub fn format_duration(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).round() as u64;
    format!("{}:{:02} h", total_minutes / 60, total_minutes % 60)
}

fn stats_line(stats: &RouteStats) -> String {
    format!(
        "{}  ↑ {}  ↓ {}  {}",
        format_distance(stats.distance_km),
        format_elevation(stats.ascent_m),
        format_elevation(stats.descent_m),
        format_duration(stats.time_h)
    )
}

/// Multi-line summary: one line per leg, then the totals.
pub fn route_summary(snapshot: &RouteSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Profile: {} ({})", snapshot.profile.name(), snapshot.profile);

    for (i, segment) in snapshot.segments.iter().enumerate() {
        let detail = match (segment.status, segment.stats.as_ref()) {
            (SegmentStatus::Resolved, Some(stats)) => stats_line(stats),
            (SegmentStatus::Resolved, None) => format!("{} points", segment.coordinates.len()),
            (SegmentStatus::Fallback, _) => "no route, straight line".to_string(),
            (SegmentStatus::Loading, _) => "loading".to_string(),
        };
        let _ = writeln!(out, "Leg {}: {} -> {}  {}", i + 1, segment.start, segment.end, detail);
    }

    match snapshot.stats.as_ref() {
        Some(stats) => {
            let _ = write!(out, "Total: {}", stats_line(stats));
        }
        None => {
            let _ = write!(out, "Total: no route statistics");
        }
    }
    out
}

/// One-line tally of how a batch of leg fetches settled.
pub fn outcome_tally(outcomes: &[LegOutcome]) -> String {
    let count = |kind: LegOutcome| outcomes.iter().filter(|o| **o == kind).count();
    format!(
        "{} routed, {} straight lines, {} stale",
        count(LegOutcome::Resolved),
        count(LegOutcome::Fallback),
        count(LegOutcome::Stale)
    )
}
