use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Identifies a live object of the world. Allocated by an
/// [IdAllocator](crate::services::IdAllocator), refreshed on every respawn.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct ObjectId(pub u32);

/// Identifies an npc template.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct TemplateId(pub u32);

/// Identifies a territory a random spawn point may be drawn from.
/// `LocationId(0)` means "no area".
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct LocationId(pub u32);

/// Instanced-world partition. Channel 0 is the shared, non-instanced world.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct ChannelId(pub u32);

/// Handle returned when registering a spawn listener
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ListenerId(pub u64);

impl LocationId {
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl ChannelId {
    pub const WORLD: ChannelId = ChannelId(0);

    pub fn is_instanced(self) -> bool {
        self.0 != 0
    }
}

macro_rules! impl_display {
    ($($id: ident),*) => {
        $(
            impl fmt::Display for $id {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_display!(ObjectId, TemplateId, LocationId, ChannelId, ListenerId);
