//! Route editor: applies edits to the segment store and drives leg fetches
//! through the routing gateway.
//!
//! An edit is two independent steps. [`RouteEditor::submit`] writes the
//! sequence change synchronously (markers never lag behind input) and returns
//! the legs to fetch; [`RouteEditor::run`] resolves them concurrently and
//! writes each result back by leg id as it completes. Edits may be submitted
//! while earlier batches are still running.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::drag::resolve_drag_insertion;
use crate::error::{InvalidEdit, RouteError};
use crate::gateway::RoutingGateway;
use crate::geometry::{Projection, DEFAULT_MAX_DRAG_DISTANCE, DEFAULT_NEAR_THRESHOLD_DEG};
use crate::models::{Point, Profile, WaypointSequence};
use crate::policy::{plan, Edit};
use crate::store::{LegOutcome, RecomputeBatch, RecomputeState, RouteSnapshot, SegmentStore};

/// An edit requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    SetStart {
        point: Point,
    },
    SetEnd {
        point: Point,
    },
    /// Append (no index) or insert at a waypoint index.
    InsertWaypoint {
        point: Point,
        #[serde(default)]
        index: Option<usize>,
    },
    MoveWaypoint {
        index: usize,
        point: Point,
    },
    RemoveWaypoint {
        index: usize,
    },
    RemoveStart,
    RemoveEnd,
    Swap,
    Clear,
    SetProfile {
        profile: Profile,
    },
    /// Drop the route and start a new one at `point`.
    Restart {
        point: Point,
    },
}

impl EditCommand {
    /// Apply the sequence change to `store`.
    pub fn apply_to(self, store: &mut SegmentStore) -> Result<Edit, InvalidEdit> {
        match self {
            EditCommand::SetStart { point } => store.set_start(point),
            EditCommand::SetEnd { point } => store.set_end(point),
            EditCommand::InsertWaypoint { point, index } => store.insert_waypoint(point, index),
            EditCommand::MoveWaypoint { index, point } => store.move_waypoint(index, point),
            EditCommand::RemoveWaypoint { index } => store.remove_waypoint(index),
            EditCommand::RemoveStart => store.remove_start(),
            EditCommand::RemoveEnd => store.remove_end(),
            EditCommand::Swap => store.swap(),
            EditCommand::Clear => Ok(store.clear()),
            EditCommand::SetProfile { profile } => Ok(store.set_profile(profile)),
            EditCommand::Restart { point } => Ok(store.restart(point)),
        }
    }

    /// The position this command places, if any.
    pub fn point(&self) -> Option<Point> {
        match *self {
            EditCommand::SetStart { point }
            | EditCommand::SetEnd { point }
            | EditCommand::InsertWaypoint { point, .. }
            | EditCommand::MoveWaypoint { point, .. }
            | EditCommand::Restart { point } => Some(point),
            _ => None,
        }
    }
}

/// Tuning for the route editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Drag insertions closer than this (degrees) to an existing point are ignored.
    pub near_threshold_deg: f64,
    /// Drag releases farther than this from the path are ignored. Measured in
    /// the plane of the projection given to [`RouteEditor::drag_insert`].
    pub max_drag_distance: f64,
    /// Upper bound on leg fetches in flight per batch.
    pub max_concurrent_fetches: usize,
    pub default_profile: Profile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            near_threshold_deg: DEFAULT_NEAR_THRESHOLD_DEG,
            max_drag_distance: DEFAULT_MAX_DRAG_DISTANCE,
            max_concurrent_fetches: 4,
            default_profile: Profile::default(),
        }
    }
}

/// Editable route backed by a routing gateway. Cloning shares the route.
pub struct RouteEditor<G> {
    store: Arc<Mutex<SegmentStore>>,
    gateway: Arc<G>,
    config: Arc<EngineConfig>,
}

impl<G> Clone for RouteEditor<G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
            config: Arc::clone(&self.config),
        }
    }
}

impl<G: RoutingGateway> RouteEditor<G> {
    pub fn new(gateway: impl Into<Arc<G>>, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(SegmentStore::new(config.default_profile))),
            gateway: gateway.into(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn store(&self) -> MutexGuard<'_, SegmentStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `command` and schedule the legs its recompute policy selects.
    pub fn try_submit(&self, command: EditCommand) -> Result<RecomputeBatch, RouteError> {
        let mut store = self.store();
        let edit = command.apply_to(&mut store)?;
        let recompute = plan(&edit, store.sequence().leg_count());
        Ok(store.begin_recompute(&recompute))
    }

    /// Like [`try_submit`](Self::try_submit), but invalid edits are ignored.
    pub fn submit(&self, command: EditCommand) -> RecomputeBatch {
        match self.try_submit(command) {
            Ok(batch) => batch,
            Err(err) => {
                tracing::debug!("Ignoring edit {:?}: {}", command, err);
                RecomputeBatch::default()
            }
        }
    }

    /// Insert a waypoint where a drag over the drawn path was released.
    ///
    /// Returns `None` when the drop is rejected; the route is left untouched.
    pub fn drag_insert<P: Projection>(&self, pointer: Point, projection: &P) -> Option<RecomputeBatch> {
        let mut store = self.store();
        let segments = store.segments();
        let insertion = resolve_drag_insertion(
            pointer,
            store.sequence(),
            &segments,
            projection,
            self.config.max_drag_distance,
            self.config.near_threshold_deg,
        )?;
        let edit = store
            .insert_waypoint(insertion.point, Some(insertion.leg_index))
            .ok()?;
        let recompute = plan(&edit, store.sequence().leg_count());
        Some(store.begin_recompute(&recompute))
    }

    /// Fetch every leg of `batch`, writing each result as soon as it arrives.
    pub async fn run(&self, batch: RecomputeBatch) -> Vec<LegOutcome> {
        if batch.is_empty() {
            return Vec::new();
        }
        let limit = self.config.max_concurrent_fetches.max(1);

        stream::iter(batch.legs)
            .map(|leg| {
                let editor = self.clone();
                async move {
                    let result = editor
                        .gateway
                        .fetch_leg(leg.start, leg.end, leg.profile)
                        .await;
                    editor.store().apply_leg_result(&leg, result)
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await
    }

    /// Submit `command`, wait for its legs, and return the resulting snapshot.
    pub async fn apply(&self, command: EditCommand) -> RouteSnapshot {
        let batch = self.submit(command);
        self.run(batch).await;
        self.snapshot()
    }

    pub fn snapshot(&self) -> RouteSnapshot {
        self.store().snapshot()
    }

    pub fn sequence(&self) -> WaypointSequence {
        self.store().sequence().clone()
    }

    pub fn profile(&self) -> Profile {
        self.store().profile()
    }

    pub fn state(&self) -> RecomputeState {
        self.store().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_commands_use_tagged_json() {
        let json = r#"{"op":"insert_waypoint","point":{"lat":1.0,"lng":2.0}}"#;
        let command: EditCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            command,
            EditCommand::InsertWaypoint {
                point: Point::new(1.0, 2.0),
                index: None
            }
        );

        let json = r#"{"op":"set_profile","profile":"car-vario"}"#;
        let command: EditCommand = serde_json::from_str(json).unwrap();
        assert_eq!(command, EditCommand::SetProfile { profile: Profile::CarVario });

        let command: EditCommand = serde_json::from_str(r#"{"op":"swap"}"#).unwrap();
        assert_eq!(command, EditCommand::Swap);
    }

    #[test]
    fn commands_expose_the_point_they_place() {
        let point = Point::new(95.0, 0.0);
        assert_eq!(EditCommand::MoveWaypoint { index: 0, point }.point(), Some(point));
        assert_eq!(EditCommand::Restart { point }.point(), Some(point));
        assert_eq!(EditCommand::RemoveWaypoint { index: 0 }.point(), None);
        assert_eq!(EditCommand::Clear.point(), None);
    }

    #[test]
    fn restart_keeps_only_the_new_start() {
        let mut store = SegmentStore::default();
        EditCommand::SetStart { point: Point::new(0.0, 0.0) }
            .apply_to(&mut store)
            .unwrap();
        EditCommand::SetEnd { point: Point::new(0.0, 1.0) }
            .apply_to(&mut store)
            .unwrap();
        let edit = EditCommand::Restart { point: Point::new(5.0, 5.0) }
            .apply_to(&mut store)
            .unwrap();
        assert_eq!(edit, Edit::EndpointPlaced);
        assert_eq!(store.sequence().start, Some(Point::new(5.0, 5.0)));
        assert!(store.sequence().end.is_none());
    }
}
