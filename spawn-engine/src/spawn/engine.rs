use super::counters::{LiveSlot, Removal};
use super::{SpawnGroup, SpawnSettings};
use crate::error::SpawnError;
use crate::geometry::{LocationPolicy, WorldPosition, HEADING_RANGE};
use crate::indices::{ChannelId, ObjectId};
use crate::npc::Npc;
use rand::distributions::Uniform;
use rand::Rng;
use slog::{debug, trace, warn};
use std::sync::Weak;
use std::time::Duration;

/// Hand a removed npc back to the spawn group that owns it.
///
/// Returns false if the npc has no group, or its group was already dropped.
pub fn notify_removed(npc: Npc) -> bool {
    match npc.spawn_group() {
        Some(group) => {
            group.on_entity_removed(npc);
            true
        }
        None => false,
    }
}

impl SpawnGroup {
    /// Spawn npcs until the group is full, then enable respawn if a delay is configured.
    ///
    /// Returns the number of npcs put into the world. Stops at the first failed spawn, since
    /// spawn failures are configuration errors that would fail again.
    pub fn fill(&self) -> u32 {
        if self.is_inert() || self.is_torn_down() {
            return 0;
        }
        let mut spawned = 0;
        loop {
            match self.try_produce(false) {
                Ok(Some(_)) => spawned += 1,
                Ok(None) => {}
                Err(SpawnError::CapacityReached(_)) => break,
                Err(err) => {
                    warn!(self.logger, "Failed to fill {}: {}", self, err);
                    break;
                }
            }
        }
        let respawn = self.respawn_min_delay() != 0;
        self.counters.set_respawn_enabled(respawn);

        debug!(
            self.logger,
            "Filled spawn {}, spawned {} npcs, respawn: {}", self, spawned, respawn
        );
        spawned
    }

    /// Spawn a single npc.
    ///
    /// `is_summon` makes the npc play its summon animation. Returns `None` if nothing was put
    /// into the world: the group is full, the spawn failed, or the template's kind is spawned
    /// elsewhere (in which case the population is still counted).
    pub fn produce(&self, is_summon: bool) -> Option<ObjectId> {
        match self.try_produce(is_summon) {
            Ok(id) => id,
            Err(err @ SpawnError::CapacityReached(_)) => {
                debug!(self.logger, "{}", err);
                None
            }
            Err(err) => {
                warn!(self.logger, "Failed to spawn npc of {}: {}", self, err);
                None
            }
        }
    }

    pub(super) fn try_produce(&self, is_summon: bool) -> Result<Option<ObjectId>, SpawnError> {
        let template = self.template.as_ref().ok_or(SpawnError::Inert)?;
        if self.is_torn_down() {
            return Err(SpawnError::Inert);
        }
        let slot = self
            .counters
            .claim_live()
            .ok_or(SpawnError::CapacityReached(template.id))?;
        // kinds spawned by their own paths only take up a slot here
        let constructor = match self.constructor.as_ref() {
            Some(c) => c,
            None => {
                slot.commit();
                return Ok(None);
            }
        };

        let id = self.context.ids.next_id();
        let mut npc = constructor.construct(id, template)?;
        npc.channel = self.channel();
        if is_summon {
            npc.show_summon_animation = true;
        }
        self.place(npc, slot).map(Some)
    }

    /// Initialize `npc` and insert it into the world, committing its live slot.
    ///
    /// On failure, or if anything on the way panics, the slot is given back.
    fn place(&self, mut npc: Npc, mut slot: LiveSlot<'_>) -> Result<ObjectId, SpawnError> {
        let settings = self.settings().clone();
        let channel = self.channel();
        let position = self.resolve_position(&settings, channel, &npc)?;

        npc.effects.clear();
        npc.is_dead = false;
        npc.is_decayed = false;
        npc.hp = npc.max_hp();
        npc.mp = npc.max_mp();
        npc.script_value = 0;
        npc.no_random_walk = settings.no_random_walk;
        npc.heading = if settings.location.has_random_heading() {
            rand::thread_rng().gen_range(0, HEADING_RANGE)
        } else {
            settings.location.heading
        };

        npc.champion = false;
        if npc.kind().is_attackable() {
            npc.champion = self.context.champions.roll(&npc, npc.channel);
        }

        npc.bind_spawn(Weak::clone(&self.this));
        npc.position = position;
        let id = npc.id;
        trace!(
            self.logger,
            "Spawned npc {} at {:?}, heading {}",
            id,
            position,
            npc.heading
        );

        let spawned = npc.clone();
        slot.bind(id);
        self.context.world.insert(npc, position);
        slot.commit();
        self.context.listeners.notify_spawned(&spawned);

        *self
            .last_spawned
            .lock()
            .unwrap_or_else(|err| err.into_inner()) = Some(id);
        Ok(id)
    }

    fn resolve_position(
        &self,
        settings: &SpawnSettings,
        channel: ChannelId,
        npc: &Npc,
    ) -> Result<WorldPosition, SpawnError> {
        let terrain = &self.context.terrain;
        match LocationPolicy::resolve(&settings.location, settings.location_id) {
            LocationPolicy::Exact(p) => {
                let z = if self.context.config.geodata_enabled {
                    terrain.ground_height(p.x, p.y, p.z, p.z, channel)
                } else {
                    p.z
                };
                Ok(WorldPosition::new(p.x, p.y, z))
            }
            LocationPolicy::Area(location) => {
                let p = self.context.areas.random_point(location)?;
                let z = terrain.ground_height(p.x, p.y, p.z_min, p.z_max, channel);
                Ok(WorldPosition::new(p.x, p.y, z))
            }
            LocationPolicy::Unset => Err(SpawnError::NoSpawnLocation(npc.template_id())),
        }
    }

    /// Account for an npc of this group leaving the world and schedule its respawn.
    ///
    /// The npc record is kept by the respawn task and reused when it fires. Never fails:
    /// problems are logged.
    pub fn on_entity_removed(&self, mut npc: Npc) {
        if let Some(owner) = npc.take_spawn() {
            if !Weak::ptr_eq(&owner, &self.this) {
                warn!(
                    self.logger,
                    "Npc {} does not belong to spawn {}, ignoring its removal", npc.id, self
                );
                return;
            }
        }

        match self.counters.remove_live(npc.id) {
            Removal::Ignored => {
                debug!(
                    self.logger,
                    "Removal of npc {} ignored, it is not live in spawn {}", npc.id, self
                );
            }
            Removal::Released => {
                trace!(self.logger, "Npc {} removed, no respawn", npc.id);
            }
            Removal::Reserved => {
                let delay = self.next_respawn_delay();
                debug!(
                    self.logger,
                    "Npc {} removed, respawning in {} ms",
                    npc.id,
                    delay.as_millis()
                );
                let group = Weak::clone(&self.this);
                self.context.scheduler.schedule(
                    Box::new(move || {
                        // the group may have been dropped with its world
                        if let Some(group) = group.upgrade() {
                            group.respawn(npc);
                        }
                    }),
                    delay,
                );
            }
        }
    }

    fn next_respawn_delay(&self) -> Duration {
        let settings = self.settings();
        let (min, max) = (settings.respawn_min_delay, settings.respawn_max_delay);
        let ms = if min >= max {
            min
        } else {
            rand::thread_rng().sample(Uniform::new_inclusive(min, max))
        };
        Duration::from_millis(ms)
    }

    /// Body of the respawn task
    fn respawn(&self, mut npc: Npc) {
        let slot = match self.counters.fire_reserved() {
            Some(slot) => slot,
            None => {
                debug!(
                    self.logger,
                    "Respawn of npc {} dropped, respawn is disabled", npc.id
                );
                return;
            }
        };
        npc.refresh_id(self.context.ids.next_id());
        if let Err(err) = self.place(npc, slot) {
            warn!(self.logger, "Failed to respawn npc of {}: {}", self, err);
        }
    }
}
