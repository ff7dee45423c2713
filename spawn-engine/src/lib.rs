//! Spawn and respawn of bounded npc populations.
//!
//! A [SpawnGroup](spawn::SpawnGroup) owns one template at one location or area. It fills its
//! population once, then every removed npc reserves a slot and schedules a delayed respawn.
//! The live and pending counters of a group never exceed its configured amount.
//!
pub mod champion;
pub mod config;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod indices;
pub mod listeners;
pub mod npc;
pub mod prelude;
pub mod scheduler;
pub mod services;
pub mod spawn;
pub mod spawn_table;

mod utils;

pub use utils::default_logger;
