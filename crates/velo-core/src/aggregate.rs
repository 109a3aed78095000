//! Merge per-leg segments into one path and one set of route totals.

use crate::models::{LoadingSegment, Point, RouteStats, Segment};

/// Concatenate segment polylines in sequence order.
///
/// Each leg after the first starts where the previous one ended, so its first
/// coordinate is dropped. Returns an empty path while any leg is loading.
pub fn merge_path(segments: &[Segment]) -> Vec<Point> {
    if segments.is_empty() || segments.iter().any(Segment::is_loading) {
        return Vec::new();
    }

    let capacity = segments.iter().map(|s| s.coordinates.len()).sum();
    let mut path = Vec::with_capacity(capacity);
    for (i, segment) in segments.iter().enumerate() {
        let skip = usize::from(i > 0 && !path.is_empty());
        path.extend(segment.coordinates.iter().skip(skip).copied());
    }
    path
}

/// Sum stats over settled legs. Loading and fallback legs contribute nothing.
pub fn sum_stats(segments: &[Segment]) -> RouteStats {
    segments
        .iter()
        .filter(|s| !s.is_loading() && !s.coordinates.is_empty())
        .filter_map(|s| s.stats)
        .fold(RouteStats::default(), |acc, stats| acc + stats)
}

/// Whether at least one leg has contributed stats.
pub fn has_stats(segments: &[Segment]) -> bool {
    segments
        .iter()
        .any(|s| !s.is_loading() && !s.coordinates.is_empty() && s.stats.is_some())
}

/// Legs currently in flight.
pub fn loading_segments(segments: &[Segment]) -> Vec<LoadingSegment> {
    segments
        .iter()
        .filter(|s| s.is_loading())
        .map(|s| LoadingSegment {
            start: s.start,
            end: s.end,
        })
        .collect()
}

/// Polyline-segment index ranges of each leg inside the merged path.
///
/// Leg `k` owns merged polyline segments `ranges[k].0 .. ranges[k].1`.
pub(crate) fn leg_ranges(segments: &[Segment]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::with_capacity(segments.len());
    let mut offset = 0usize;
    for segment in segments {
        let span = segment.coordinates.len().saturating_sub(1);
        ranges.push((offset, offset + span));
        offset += span;
    }
    ranges
}
