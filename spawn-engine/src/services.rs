//! Collaborators of the spawn engine.
//!
//! The engine only consumes these through narrow traits. The implementations in this module are
//! the simple in-process variants used by tools and tests.
//!
use crate::error::SpawnError;
use crate::geometry::WorldPosition;
use crate::indices::{ChannelId, LocationId, ObjectId};
use crate::npc::Npc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

pub trait IdAllocator: Send + Sync {
    fn next_id(&self) -> ObjectId;
}

/// Random point inside an area, together with the height bounds the terrain may resolve to
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AreaPoint {
    pub x: i32,
    pub y: i32,
    pub z_min: i32,
    pub z_max: i32,
}

pub trait AreaResolver: Send + Sync {
    fn random_point(&self, location: LocationId) -> Result<AreaPoint, SpawnError>;
}

pub trait TerrainService: Send + Sync {
    /// Height of the ground at `(x, y)` closest to the hinted heights
    fn ground_height(&self, x: i32, y: i32, z_hint: i32, z_hint2: i32, channel: ChannelId)
        -> i32;
}

/// The visible world npcs are inserted into
pub trait WorldView: Send + Sync {
    fn insert(&self, npc: Npc, position: WorldPosition);
}

#[derive(Debug)]
pub struct SequentialIdAllocator {
    next: AtomicU32,
}

impl SequentialIdAllocator {
    pub fn new(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }
}

impl Default for SequentialIdAllocator {
    fn default() -> Self {
        // ids below this are reserved for players and items
        Self::new(0x1000_0000)
    }
}

impl IdAllocator for SequentialIdAllocator {
    fn next_id(&self) -> ObjectId {
        ObjectId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Terrain without geodata: the hinted height is the ground.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain;

impl TerrainService for FlatTerrain {
    fn ground_height(&self, _x: i32, _y: i32, z_hint: i32, _: i32, _: ChannelId) -> i32 {
        z_hint
    }
}

/// Areas defined as axis aligned rectangles
#[derive(Debug, Default)]
pub struct StaticAreas {
    areas: RwLock<HashMap<LocationId, AreaBounds>>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AreaBounds {
    pub min: WorldPosition,
    pub max: WorldPosition,
}

impl AreaBounds {
    /// Bounds spanned by two opposite corners, in any order
    pub fn new(a: WorldPosition, b: WorldPosition) -> Self {
        Self {
            min: WorldPosition::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: WorldPosition::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }
}

impl StaticAreas {
    /// Bounds with swapped corners are normalized.
    pub fn insert(&self, id: LocationId, bounds: AreaBounds) {
        let bounds = AreaBounds::new(bounds.min, bounds.max);
        self.areas
            .write()
            .unwrap_or_else(|err| err.into_inner())
            .insert(id, bounds);
    }
}

impl AreaResolver for StaticAreas {
    fn random_point(&self, location: LocationId) -> Result<AreaPoint, SpawnError> {
        use rand::distributions::Uniform;
        use rand::Rng;

        let bounds = *self
            .areas
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .get(&location)
            .ok_or(SpawnError::UnknownArea(location))?;

        let mut rng = rand::thread_rng();
        let (min, max) = (bounds.min, bounds.max);
        Ok(AreaPoint {
            x: rng.sample(Uniform::new_inclusive(min.x, max.x)),
            y: rng.sample(Uniform::new_inclusive(min.y, max.y)),
            z_min: min.z,
            z_max: max.z,
        })
    }
}
