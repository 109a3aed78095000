//! Segment store: the waypoint sequence and its content-keyed leg segments.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::aggregate::{has_stats, loading_segments, merge_path, sum_stats};
use crate::error::{InvalidEdit, RouteError};
use crate::geometry::segment_key;
use crate::models::{
    LegRoute, LoadingSegment, Point, Profile, RouteStats, Segment, SegmentStatus, WaypointSequence,
};
use crate::policy::{Edit, Recompute};

/// A single leg fetch issued by a recompute batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegRequest {
    pub id: String,
    pub start: Point,
    pub end: Point,
    pub profile: Profile,
    /// Generation of this request; only the latest ticket per leg may write.
    pub ticket: u64,
}

/// Legs to fetch after one edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeBatch {
    pub legs: Vec<LegRequest>,
}

impl RecomputeBatch {
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegOutcome {
    Resolved,
    /// Failed or empty fetch replaced by a straight line.
    Fallback,
    /// Superseded by a newer request, or the leg left the sequence.
    Stale,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecomputeState {
    #[default]
    Idle,
    Recomputing,
}

/// Everything the rendering layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub sequence: WaypointSequence,
    pub profile: Profile,
    pub segments: Vec<Segment>,
    pub path: Vec<Point>,
    pub loading_segments: Vec<LoadingSegment>,
    pub stats: Option<RouteStats>,
    pub state: RecomputeState,
}

#[derive(Debug, Default)]
pub struct SegmentStore {
    sequence: WaypointSequence,
    profile: Profile,
    segments: HashMap<String, Segment>,
    pending: HashMap<String, u64>,
    next_ticket: u64,
}

impl SegmentStore {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    pub fn sequence(&self) -> &WaypointSequence {
        &self.sequence
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn state(&self) -> RecomputeState {
        if self.pending.is_empty() {
            RecomputeState::Idle
        } else {
            RecomputeState::Recomputing
        }
    }

    // ========== SEQUENCE EDITS ==========

    pub fn set_start(&mut self, point: Point) -> Result<Edit, InvalidEdit> {
        if self.sequence.start.is_some_and(|s| s.same_place(&point)) {
            return Ok(Edit::Unchanged);
        }
        let had_route = self.sequence.has_route();
        self.sequence.start = Some(point);
        Ok(self.endpoint_edit(had_route, Edit::StartMoved))
    }

    pub fn set_end(&mut self, point: Point) -> Result<Edit, InvalidEdit> {
        if self.sequence.end.is_some_and(|e| e.same_place(&point)) {
            return Ok(Edit::Unchanged);
        }
        let had_route = self.sequence.has_route();
        self.sequence.end = Some(point);
        Ok(self.endpoint_edit(had_route, Edit::EndMoved))
    }

    fn endpoint_edit(&self, had_route: bool, moved: Edit) -> Edit {
        if had_route {
            moved
        } else if self.sequence.has_route() {
            Edit::RouteEstablished
        } else {
            Edit::EndpointPlaced
        }
    }

    /// Insert an interior waypoint. `None` appends before the end; `Some(i)`
    /// places it at waypoint index `i`, splitting leg `i`.
    pub fn insert_waypoint(&mut self, point: Point, index: Option<usize>) -> Result<Edit, InvalidEdit> {
        if !self.sequence.has_route() {
            return Err(InvalidEdit::MissingEndpoints);
        }
        let len = self.sequence.waypoints.len();
        match index {
            None => {
                self.sequence.waypoints.push(point);
                Ok(Edit::WaypointAppended)
            }
            Some(index) if index <= len => {
                self.sequence.waypoints.insert(index, point);
                Ok(Edit::WaypointSplit { leg: index })
            }
            Some(index) => Err(InvalidEdit::IndexOutOfRange { index, len }),
        }
    }

    pub fn move_waypoint(&mut self, index: usize, point: Point) -> Result<Edit, InvalidEdit> {
        let len = self.sequence.waypoints.len();
        let Some(slot) = self.sequence.waypoints.get_mut(index) else {
            return Err(InvalidEdit::IndexOutOfRange { index, len });
        };
        if slot.same_place(&point) {
            return Ok(Edit::Unchanged);
        }
        *slot = point;
        Ok(Edit::WaypointMoved { index })
    }

    pub fn remove_waypoint(&mut self, index: usize) -> Result<Edit, InvalidEdit> {
        let len = self.sequence.waypoints.len();
        if index >= len {
            return Err(InvalidEdit::IndexOutOfRange { index, len });
        }
        self.sequence.waypoints.remove(index);
        Ok(Edit::WaypointRemoved { index })
    }

    /// Delete the start, promoting the first waypoint; with no waypoint left
    /// the whole route is cleared.
    pub fn remove_start(&mut self) -> Result<Edit, InvalidEdit> {
        if self.sequence.start.is_none() {
            return Err(InvalidEdit::MissingEndpoints);
        }
        if self.sequence.waypoints.is_empty() {
            self.clear();
            return Ok(Edit::EndpointRemoved { route_survives: false });
        }
        self.sequence.start = Some(self.sequence.waypoints.remove(0));
        Ok(Edit::EndpointRemoved {
            route_survives: self.sequence.has_route(),
        })
    }

    /// Delete the end, promoting the last waypoint; with no waypoint left the
    /// whole route is cleared.
    pub fn remove_end(&mut self) -> Result<Edit, InvalidEdit> {
        if self.sequence.end.is_none() {
            return Err(InvalidEdit::MissingEndpoints);
        }
        match self.sequence.waypoints.pop() {
            Some(promoted) => {
                self.sequence.end = Some(promoted);
                Ok(Edit::EndpointRemoved {
                    route_survives: self.sequence.has_route(),
                })
            }
            None => {
                self.clear();
                Ok(Edit::EndpointRemoved { route_survives: false })
            }
        }
    }

    pub fn swap(&mut self) -> Result<Edit, InvalidEdit> {
        if !self.sequence.has_route() {
            return Err(InvalidEdit::MissingEndpoints);
        }
        let seq = &mut self.sequence;
        std::mem::swap(&mut seq.start, &mut seq.end);
        seq.waypoints.reverse();
        Ok(Edit::Swapped)
    }

    pub fn clear(&mut self) -> Edit {
        self.sequence = WaypointSequence::default();
        self.segments.clear();
        self.pending.clear();
        Edit::Cleared
    }

    /// Drop the current route and begin a new one at `point`.
    pub fn restart(&mut self, point: Point) -> Edit {
        self.clear();
        self.sequence.start = Some(point);
        Edit::EndpointPlaced
    }

    pub fn set_profile(&mut self, profile: Profile) -> Edit {
        if self.profile == profile {
            return Edit::Unchanged;
        }
        self.profile = profile;
        Edit::ProfileChanged
    }

    // ========== RECOMPUTE ==========

    /// Reconcile segments with the current legs and issue fetches.
    ///
    /// Segments and tickets of legs that left the sequence are discarded.
    /// Selected legs are marked loading in place; legs without any segment
    /// are always scheduled so every leg ends up with one.
    pub fn begin_recompute(&mut self, recompute: &Recompute) -> RecomputeBatch {
        let legs = self.sequence.legs();
        let keys: Vec<String> = legs.iter().map(|(a, b)| segment_key(*a, *b)).collect();
        let live: HashSet<&str> = keys.iter().map(String::as_str).collect();
        self.segments.retain(|id, _| live.contains(id.as_str()));
        self.pending.retain(|id, _| live.contains(id.as_str()));

        let mut selected: BTreeSet<usize> = recompute.selected(legs.len()).into_iter().collect();
        for (i, key) in keys.iter().enumerate() {
            if !self.segments.contains_key(key) {
                selected.insert(i);
            }
        }

        let mut issued: HashSet<&str> = HashSet::new();
        let mut batch = RecomputeBatch::default();
        for i in selected {
            let (start, end) = legs[i];
            let id = &keys[i];
            // Repeated legs share one segment and one fetch.
            if !issued.insert(id.as_str()) {
                continue;
            }

            self.segments
                .entry(id.clone())
                .and_modify(|segment| segment.status = SegmentStatus::Loading)
                .or_insert_with(|| Segment::loading(start, end));

            self.next_ticket += 1;
            self.pending.insert(id.clone(), self.next_ticket);
            batch.legs.push(LegRequest {
                id: id.clone(),
                start,
                end,
                profile: self.profile,
                ticket: self.next_ticket,
            });
        }

        if !batch.is_empty() {
            tracing::debug!(
                "Issued {} leg fetch(es) of {} leg(s) under profile {}",
                batch.len(),
                legs.len(),
                self.profile
            );
        }
        batch
    }

    /// Write a finished fetch into its leg, unless a newer request superseded it.
    pub fn apply_leg_result(&mut self, leg: &LegRequest, result: Result<LegRoute, RouteError>) -> LegOutcome {
        if self.pending.get(&leg.id) != Some(&leg.ticket) {
            tracing::debug!("Dropping stale result for leg {} (ticket {})", leg.id, leg.ticket);
            return LegOutcome::Stale;
        }
        self.pending.remove(&leg.id);

        let (segment, outcome) = match result {
            Ok(route) if route.coordinates.len() >= 2 => (
                Segment::resolved(leg.start, leg.end, route.coordinates, route.stats),
                LegOutcome::Resolved,
            ),
            Ok(_) => {
                tracing::warn!("Leg {} has no route, drawing a straight line", leg.id);
                (Segment::fallback(leg.start, leg.end), LegOutcome::Fallback)
            }
            Err(err) => {
                tracing::warn!("Leg {} fetch failed, drawing a straight line: {}", leg.id, err);
                (Segment::fallback(leg.start, leg.end), LegOutcome::Fallback)
            }
        };
        self.segments.insert(leg.id.clone(), segment);
        outcome
    }

    // ========== VIEWS ==========

    /// Segments of the current legs, in sequence order.
    pub fn segments(&self) -> Vec<Segment> {
        self.sequence
            .legs()
            .into_iter()
            .filter_map(|(a, b)| self.segments.get(&segment_key(a, b)).cloned())
            .collect()
    }

    pub fn snapshot(&self) -> RouteSnapshot {
        let segments = self.segments();
        RouteSnapshot {
            sequence: self.sequence.clone(),
            profile: self.profile,
            path: merge_path(&segments),
            loading_segments: loading_segments(&segments),
            stats: has_stats(&segments).then(|| sum_stats(&segments)),
            segments,
            state: self.state(),
        }
    }
}
