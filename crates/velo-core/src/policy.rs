//! Recompute policies: which legs must be re-fetched after an edit.

use serde::{Deserialize, Serialize};

/// Shape of a change the segment store applied to the waypoint sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edit {
    /// Identical input; nothing changed.
    Unchanged,
    /// One endpoint placed while the other is still missing.
    EndpointPlaced,
    /// Start and end are both set for the first time.
    RouteEstablished,
    StartMoved,
    EndMoved,
    WaypointAppended,
    /// Waypoint inserted inside leg `leg`, splitting it in two.
    WaypointSplit { leg: usize },
    WaypointMoved { index: usize },
    WaypointRemoved { index: usize },
    /// Start or end deleted; `route_survives` when a waypoint was promoted.
    EndpointRemoved { route_survives: bool },
    Swapped,
    ProfileChanged,
    Cleared,
}

/// Legs to re-fetch, as indices into the current leg list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recompute {
    Nothing,
    All,
    Legs(Vec<usize>),
}

impl Recompute {
    /// Leg indices selected out of `leg_count` legs, ascending, in range.
    pub fn selected(&self, leg_count: usize) -> Vec<usize> {
        match self {
            Recompute::Nothing => Vec::new(),
            Recompute::All => (0..leg_count).collect(),
            Recompute::Legs(legs) => {
                let mut legs: Vec<usize> = legs.iter().copied().filter(|&i| i < leg_count).collect();
                legs.sort_unstable();
                legs.dedup();
                legs
            }
        }
    }
}

/// Decide recompute granularity for `edit` given the leg count after the edit.
pub fn plan(edit: &Edit, leg_count: usize) -> Recompute {
    if leg_count == 0 {
        return Recompute::Nothing;
    }

    match *edit {
        Edit::Unchanged | Edit::EndpointPlaced | Edit::Cleared => Recompute::Nothing,
        Edit::RouteEstablished => Recompute::All,
        // Endpoint drags only touch their own leg; interior legs keep their segments.
        Edit::StartMoved => Recompute::Legs(vec![0]),
        Edit::EndMoved => Recompute::Legs(vec![leg_count - 1]),
        Edit::WaypointAppended => Recompute::All,
        Edit::WaypointSplit { leg } => Recompute::Legs(vec![leg, leg + 1]),
        // A moved or removed waypoint reshapes both neighbors; sequences are short.
        Edit::WaypointMoved { .. } | Edit::WaypointRemoved { .. } => Recompute::All,
        Edit::EndpointRemoved { route_survives } => {
            if route_survives {
                Recompute::All
            } else {
                Recompute::Nothing
            }
        }
        Edit::Swapped => Recompute::All,
        Edit::ProfileChanged => Recompute::All,
    }
}
