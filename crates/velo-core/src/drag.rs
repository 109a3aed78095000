//! Drag-insertion: turn a pointer released over the drawn path into a new
//! waypoint at the right logical position.

use serde::{Deserialize, Serialize};

use crate::aggregate::{leg_ranges, merge_path};
use crate::geometry::{is_near_existing_point, nearest_point_on_polyline, Projection};
use crate::models::{Point, Segment, WaypointSequence};

/// Where a dragged point goes: its location on the path and the leg it splits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragInsertion {
    pub point: Point,
    /// Index of the leg being split; also the waypoint index to insert at.
    pub leg_index: usize,
}

/// Resolve a pointer release into an insertion, or `None` to ignore it.
///
/// The pointer is projected onto the merged path. Drops farther than
/// `max_distance` (plane units of `projection`) from the path are rejected.
/// So are insertions within `threshold_deg` of the start, a waypoint or the
/// end, and drops while any leg is still loading.
pub fn resolve_drag_insertion<P: Projection>(
    pointer: Point,
    sequence: &WaypointSequence,
    segments: &[Segment],
    projection: &P,
    max_distance: f64,
    threshold_deg: f64,
) -> Option<DragInsertion> {
    if !sequence.has_route() || segments.len() != sequence.leg_count() {
        return None;
    }

    let path = merge_path(segments);
    let hit = nearest_point_on_polyline(pointer, &path, projection)?;
    if hit.distance > max_distance {
        tracing::debug!("Ignoring drag release at {}: {:.1} away from the path", pointer, hit.distance);
        return None;
    }

    if is_near_existing_point(hit.point, &sequence.logical(), threshold_deg) {
        tracing::debug!("Ignoring drag insertion at {}: too close to an existing point", hit.point);
        return None;
    }

    let leg_index = leg_for_path_segment(segments, hit.segment_index);
    Some(DragInsertion {
        point: hit.point,
        leg_index,
    })
}

/// Map an index into the merged polyline back to the logical leg owning it.
fn leg_for_path_segment(segments: &[Segment], path_segment: usize) -> usize {
    leg_ranges(segments)
        .iter()
        .position(|&(from, to)| path_segment >= from && path_segment < to)
        .unwrap_or_else(|| segments.len().saturating_sub(1))
}
