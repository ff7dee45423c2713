pub use crate::champion::{ChampionPolicy, ConfiguredChampionPolicy, NoChampions};
pub use crate::config::{ChampionConfig, SpawnConfig};
pub use crate::error::{FactoryError, SpawnError};
pub use crate::factory::{EntityRegistry, NpcConstructor};
pub use crate::geometry::{Location, LocationPolicy, WorldPosition, RANDOM_HEADING};
pub use crate::indices::*;
pub use crate::listeners::{SpawnListener, SpawnListenerRegistry};
pub use crate::npc::{Npc, NpcKind, NpcTemplate};
pub use crate::scheduler::{ScheduledTask, TaskScheduler, TickScheduler};
pub use crate::services::{
    AreaPoint, AreaResolver, FlatTerrain, IdAllocator, SequentialIdAllocator, StaticAreas,
    TerrainService, WorldView,
};
pub use crate::spawn::{notify_removed, SpawnContext, SpawnGroup};
pub use crate::spawn_table::SpawnTable;

#[cfg(feature = "async-scheduler")]
pub use crate::scheduler::AsyncStdScheduler;
