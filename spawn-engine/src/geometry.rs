use crate::indices::LocationId;
use serde_derive::{Deserialize, Serialize};

/// Heading value meaning "draw a new random heading on every spawn"
pub const RANDOM_HEADING: i32 = -1;

/// Random headings are drawn from `[0, HEADING_RANGE)`
pub const HEADING_RANGE: i32 = 61794;

/// A point of the world
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Spawn point of a group.
///
/// `x == 0 && y == 0` is the sentinel for "spawn inside the group's area".
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(default)]
    pub heading: i32,
}

impl Location {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            x,
            y,
            z,
            heading: 0,
        }
    }

    pub fn with_heading(mut self, heading: i32) -> Self {
        self.heading = heading;
        self
    }

    pub fn uses_area(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    pub fn has_random_heading(&self) -> bool {
        self.heading == RANDOM_HEADING
    }

    pub fn position(&self) -> WorldPosition {
        WorldPosition::new(self.x, self.y, self.z)
    }
}

/// Decoded form of the `(location, location_id)` pair of a spawn group
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LocationPolicy {
    Exact(WorldPosition),
    Area(LocationId),
    /// Neither a point nor an area was configured
    Unset,
}

impl LocationPolicy {
    pub fn resolve(location: &Location, location_id: LocationId) -> Self {
        if !location.uses_area() {
            LocationPolicy::Exact(location.position())
        } else if location_id.is_none() {
            LocationPolicy::Unset
        } else {
            LocationPolicy::Area(location_id)
        }
    }
}
