//! Spawn groups: bounded npc populations of one template at one location or area.
//!
//! - [fill](SpawnGroup::fill) populates the group once, when its world starts
//! - every npc removed from the world is handed back with
//!   [on_entity_removed](SpawnGroup::on_entity_removed), which reserves a respawn slot and
//!   schedules a delayed respawn of the same npc record
//! - the respawn task re-initializes the npc and puts it back into the world
//!
mod counters;
mod engine;

pub use self::counters::CounterSnapshot;
pub use self::engine::notify_removed;

use self::counters::Counters;
use crate::champion::{ChampionPolicy, ConfiguredChampionPolicy};
use crate::config::SpawnConfig;
use crate::error::SpawnError;
use crate::factory::{EntityRegistry, NpcConstructor};
use crate::geometry::{Location, LocationPolicy};
use crate::indices::{ChannelId, LocationId, ObjectId, TemplateId};
use crate::listeners::SpawnListenerRegistry;
use crate::npc::NpcTemplate;
use crate::scheduler::TaskScheduler;
use crate::services::{
    AreaResolver, FlatTerrain, IdAllocator, SequentialIdAllocator, StaticAreas, TerrainService,
    WorldView,
};
use slog::{o, warn, FnValue, Logger, Record};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Respawn delays are never shorter than this, unless respawn is disabled
pub const MIN_RESPAWN_DELAY_SECS: i64 = 10;

/// Services shared by every spawn group of a world
pub struct SpawnContext {
    pub logger: Logger,
    pub config: SpawnConfig,
    pub ids: Arc<dyn IdAllocator>,
    pub areas: Arc<dyn AreaResolver>,
    pub terrain: Arc<dyn TerrainService>,
    pub scheduler: Arc<dyn TaskScheduler>,
    pub world: Arc<dyn WorldView>,
    pub listeners: Arc<SpawnListenerRegistry>,
    pub champions: Arc<dyn ChampionPolicy>,
}

impl SpawnContext {
    /// Context with sequential ids, flat terrain, no areas and the configured champion policy
    pub fn new(
        logger: impl Into<Option<Logger>>,
        config: SpawnConfig,
        world: Arc<dyn WorldView>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        let logger = logger.into().unwrap_or_else(crate::default_logger);
        let listeners = Arc::new(SpawnListenerRegistry::new(
            logger.new(o!("component" => "spawn_listeners")),
        ));
        let champions = Arc::new(ConfiguredChampionPolicy::new(config.champion.clone()));
        Self {
            logger,
            config,
            ids: Arc::new(SequentialIdAllocator::default()),
            areas: Arc::new(StaticAreas::default()),
            terrain: Arc::new(FlatTerrain),
            scheduler,
            world,
            listeners,
            champions,
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_areas(mut self, areas: Arc<dyn AreaResolver>) -> Self {
        self.areas = areas;
        self
    }

    pub fn with_terrain(mut self, terrain: Arc<dyn TerrainService>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_listeners(mut self, listeners: Arc<SpawnListenerRegistry>) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn with_champions(mut self, champions: Arc<dyn ChampionPolicy>) -> Self {
        self.champions = champions;
        self
    }
}

impl fmt::Debug for SpawnContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnContext")
            .field("config", &self.config)
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct SpawnSettings {
    location: Location,
    location_id: LocationId,
    /// milliseconds
    respawn_min_delay: u64,
    /// milliseconds
    respawn_max_delay: u64,
    custom: bool,
    no_random_walk: bool,
}

pub struct SpawnGroup {
    logger: Logger,
    context: Arc<SpawnContext>,
    template: Option<Arc<NpcTemplate>>,
    /// `None` for inert groups and for kinds that are never constructed here
    constructor: Option<Arc<dyn NpcConstructor>>,
    settings: RwLock<SpawnSettings>,
    /// Shared with the `channel` value of the logger
    channel: Arc<AtomicU32>,
    counters: Counters,
    last_spawned: Mutex<Option<ObjectId>>,
    torn_down: AtomicBool,
    this: Weak<SpawnGroup>,
}

impl SpawnGroup {
    /// Bind a new group to `template`.
    ///
    /// Fails if the template's kind has no constructor in `registry`. A group without template
    /// is inert: all of its operations are no-ops.
    pub fn new(
        context: Arc<SpawnContext>,
        template: impl Into<Option<Arc<NpcTemplate>>>,
        registry: &EntityRegistry,
    ) -> Result<Arc<Self>, SpawnError> {
        let template = template.into();
        let constructor = match template.as_ref() {
            Some(t) if !t.kind.is_excluded() => {
                let constructor = registry.resolve(t.kind).map_err(|_| {
                    let err = SpawnError::UnknownKind {
                        template: t.id,
                        kind: t.kind,
                    };
                    warn!(context.logger, "Failed to create spawn group: {}", err);
                    err
                })?;
                Some(constructor)
            }
            _ => None,
        };
        let channel = Arc::new(AtomicU32::new(ChannelId::WORLD.0));
        let logger = {
            let channel = Arc::clone(&channel);
            let channel = FnValue(move |_: &Record| channel.load(Ordering::Relaxed));
            match template.as_ref() {
                Some(t) => context
                    .logger
                    .new(o!("template" => t.id.0, "channel" => channel)),
                None => context
                    .logger
                    .new(o!("template" => "none", "channel" => channel)),
            }
        };

        let group = Arc::new_cyclic(|this| SpawnGroup {
            logger,
            context,
            template,
            constructor,
            settings: RwLock::new(SpawnSettings::default()),
            channel,
            counters: Counters::default(),
            last_spawned: Mutex::new(None),
            torn_down: AtomicBool::new(false),
            this: this.clone(),
        });
        Ok(group)
    }

    fn settings(&self) -> RwLockReadGuard<SpawnSettings> {
        self.settings.read().unwrap_or_else(|err| err.into_inner())
    }

    fn settings_mut(&self) -> RwLockWriteGuard<SpawnSettings> {
        self.settings.write().unwrap_or_else(|err| err.into_inner())
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn context(&self) -> &Arc<SpawnContext> {
        &self.context
    }

    pub fn template(&self) -> Option<&Arc<NpcTemplate>> {
        self.template.as_ref()
    }

    pub fn template_id(&self) -> Option<TemplateId> {
        self.template.as_ref().map(|t| t.id)
    }

    pub fn is_inert(&self) -> bool {
        self.template.is_none()
    }

    // population

    /// Maximum number of npcs this group manages
    pub fn amount(&self) -> u32 {
        self.counters.snapshot().maximum
    }

    /// Lowering the amount below the live population keeps the live npcs; no respawn is
    /// scheduled until the population drops under the new amount.
    pub fn set_amount(&self, amount: u32) {
        self.counters.set_maximum(amount);
    }

    pub fn current_count(&self) -> u32 {
        self.counters.snapshot().current
    }

    pub fn scheduled_count(&self) -> u32 {
        self.counters.snapshot().scheduled
    }

    /// Consistent view of all counters
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Whether `id` is an npc this group put into the world that has not been removed yet
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.counters.is_live(id)
    }

    pub fn last_spawned(&self) -> Option<ObjectId> {
        *self.last_spawned.lock().unwrap_or_else(|err| err.into_inner())
    }

    // location

    pub fn location(&self) -> Location {
        self.settings().location
    }

    pub fn set_location(&self, location: Location) {
        self.settings_mut().location = location;
    }

    pub fn x(&self) -> i32 {
        self.settings().location.x
    }

    pub fn set_x(&self, x: i32) {
        self.settings_mut().location.x = x;
    }

    pub fn y(&self) -> i32 {
        self.settings().location.y
    }

    pub fn set_y(&self, y: i32) {
        self.settings_mut().location.y = y;
    }

    pub fn z(&self) -> i32 {
        self.settings().location.z
    }

    pub fn set_z(&self, z: i32) {
        self.settings_mut().location.z = z;
    }

    pub fn set_xyz(&self, x: i32, y: i32, z: i32) {
        let mut settings = self.settings_mut();
        settings.location.x = x;
        settings.location.y = y;
        settings.location.z = z;
    }

    /// `-1` means a random heading on every spawn
    pub fn heading(&self) -> i32 {
        self.settings().location.heading
    }

    pub fn set_heading(&self, heading: i32) {
        self.settings_mut().location.heading = heading;
    }

    pub fn location_id(&self) -> LocationId {
        self.settings().location_id
    }

    pub fn set_location_id(&self, id: LocationId) {
        self.settings_mut().location_id = id;
    }

    pub fn location_policy(&self) -> LocationPolicy {
        let settings = self.settings();
        LocationPolicy::resolve(&settings.location, settings.location_id)
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId(self.channel.load(Ordering::Relaxed))
    }

    pub fn set_channel(&self, channel: ChannelId) {
        self.channel.store(channel.0, Ordering::Relaxed);
    }

    // flags

    pub fn is_custom(&self) -> bool {
        self.settings().custom
    }

    pub fn set_custom(&self, custom: bool) {
        self.settings_mut().custom = custom;
    }

    pub fn is_no_random_walk(&self) -> bool {
        self.settings().no_random_walk
    }

    pub fn set_no_random_walk(&self, value: bool) {
        self.settings_mut().no_random_walk = value;
    }

    // respawn

    pub fn is_respawn_enabled(&self) -> bool {
        self.counters.snapshot().respawn_enabled
    }

    pub fn start_respawn(&self) {
        if self.torn_down.load(Ordering::Acquire) {
            return;
        }
        self.counters.set_respawn_enabled(true);
    }

    /// Pending respawn tasks still run, but only release their reservation
    pub fn stop_respawn(&self) {
        self.counters.set_respawn_enabled(false);
    }

    /// Detach the group from its world. Respawn tasks firing afterwards are no-ops.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
        self.counters.set_respawn_enabled(false);
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Milliseconds
    pub fn respawn_min_delay(&self) -> u64 {
        self.settings().respawn_min_delay
    }

    /// Milliseconds
    pub fn respawn_max_delay(&self) -> u64 {
        self.settings().respawn_max_delay
    }

    /// Milliseconds. Raises the maximum delay if needed.
    pub fn set_respawn_min_delay(&self, delay: u64) {
        let mut settings = self.settings_mut();
        settings.respawn_min_delay = delay;
        settings.respawn_max_delay = settings.respawn_max_delay.max(delay);
    }

    /// Milliseconds. Lowers the minimum delay if needed.
    pub fn set_respawn_max_delay(&self, delay: u64) {
        let mut settings = self.settings_mut();
        settings.respawn_max_delay = delay;
        settings.respawn_min_delay = settings.respawn_min_delay.min(delay);
    }

    /// Mean respawn delay in milliseconds
    pub fn respawn_delay(&self) -> u64 {
        let settings = self.settings();
        let (min, max) = (settings.respawn_min_delay, settings.respawn_max_delay);
        min + max.saturating_sub(min) / 2
    }

    pub fn has_random_respawn(&self) -> bool {
        let settings = self.settings();
        settings.respawn_min_delay != settings.respawn_max_delay
    }

    /// Set the respawn delay to `delay ± random_interval` seconds.
    ///
    /// Both bounds are floored to 10 seconds. A zero `delay` disables respawn.
    pub fn set_respawn_delay(&self, delay: i32, random_interval: u32) {
        let (min, max) = if delay != 0 {
            if delay < 0 {
                warn!(self.logger, "Respawn delay is negative for spawn {}", self);
            }
            let delay = i64::from(delay);
            let interval = i64::from(random_interval);
            let min = (delay - interval).max(MIN_RESPAWN_DELAY_SECS) * 1000;
            let max = (delay + interval).max(MIN_RESPAWN_DELAY_SECS) * 1000;
            (min as u64, max as u64)
        } else {
            (0, 0)
        };
        let mut settings = self.settings_mut();
        settings.respawn_min_delay = min;
        settings.respawn_max_delay = max;
    }

    pub fn set_respawn_delay_fixed(&self, delay: i32) {
        self.set_respawn_delay(delay, 0);
    }
}

impl fmt::Display for SpawnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.settings();
        let loc = settings.location;
        match self.template_id() {
            Some(id) => write!(f, "SpawnGroup [template={}", id)?,
            None => write!(f, "SpawnGroup [template=none")?,
        }
        write!(
            f,
            ", x={}, y={}, z={}, heading={}]",
            loc.x, loc.y, loc.z, loc.heading
        )
    }
}

impl fmt::Debug for SpawnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnGroup")
            .field("template", &self.template_id())
            .field("settings", &*self.settings())
            .field("counters", &self.counters.snapshot())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}
