//! Map interaction dispatch: translate pointer and toolbar events into edits.

use serde::{Deserialize, Serialize};

use crate::editor::EditCommand;
use crate::models::{Point, Profile, WaypointSequence};

/// Interaction state owned by the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionMode {
    /// Map clicks place route points.
    pub editing: bool,
    /// A marker or the path is being dragged; clicks are swallowed until the
    /// drag ends, either as a marker drag-end event or a path drop.
    pub dragging: bool,
}

impl Default for InteractionMode {
    fn default() -> Self {
        Self {
            editing: true,
            dragging: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    Click { point: Point },
    DragStarted,
    StartDragEnd { point: Point },
    EndDragEnd { point: Point },
    WaypointDragEnd { index: usize, point: Point },
    WaypointDoubleClick { index: usize },
    ToggleEdit,
    Clear,
    Swap,
    ProfileChanged { profile: Profile },
}

impl MapEvent {
    /// The map position carried by the event, if any.
    pub fn point(&self) -> Option<Point> {
        match *self {
            MapEvent::Click { point }
            | MapEvent::StartDragEnd { point }
            | MapEvent::EndDragEnd { point }
            | MapEvent::WaypointDragEnd { point, .. } => Some(point),
            _ => None,
        }
    }
}

/// Map an event to the edit it requests, updating `mode` along the way.
pub fn dispatch(event: MapEvent, mode: &mut InteractionMode, sequence: &WaypointSequence) -> Option<EditCommand> {
    match event {
        MapEvent::Click { point } => {
            if !mode.editing || mode.dragging {
                return None;
            }
            match (sequence.start, sequence.end) {
                (None, _) => Some(EditCommand::SetStart { point }),
                (Some(_), None) => {
                    mode.editing = false;
                    Some(EditCommand::SetEnd { point })
                }
                (Some(_), Some(_)) => Some(EditCommand::Restart { point }),
            }
        }
        MapEvent::DragStarted => {
            mode.dragging = true;
            None
        }
        MapEvent::StartDragEnd { point } => {
            mode.dragging = false;
            Some(EditCommand::SetStart { point })
        }
        MapEvent::EndDragEnd { point } => {
            mode.dragging = false;
            Some(EditCommand::SetEnd { point })
        }
        MapEvent::WaypointDragEnd { index, point } => {
            mode.dragging = false;
            Some(EditCommand::MoveWaypoint { index, point })
        }
        MapEvent::WaypointDoubleClick { index } => Some(EditCommand::RemoveWaypoint { index }),
        MapEvent::ToggleEdit => {
            mode.editing = !mode.editing;
            mode.editing.then_some(EditCommand::Clear)
        }
        MapEvent::Clear => Some(EditCommand::Clear),
        MapEvent::Swap => Some(EditCommand::Swap),
        MapEvent::ProfileChanged { profile } => Some(EditCommand::SetProfile { profile }),
    }
}
