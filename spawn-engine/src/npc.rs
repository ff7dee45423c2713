use crate::geometry::WorldPosition;
use crate::indices::{ChannelId, ObjectId, TemplateId};
use crate::spawn::SpawnGroup;
use serde_derive::{Deserialize, Serialize};
use std::sync::{Arc, Weak};

/// Behaviour class of an npc. Selects the constructor used by
/// [EntityRegistry](crate::factory::EntityRegistry).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NpcKind {
    Monster,
    RaidBoss,
    GrandBoss,
    Minion,
    Guard,
    SiegeGuard,
    FriendlyMob,
    Folk,
    Merchant,
    Artefact,
    Chest,
    FeedableBeast,
    TamedBeast,
    // the following are materialized by their own summoning paths
    Pet,
    Decoy,
    Trap,
    EffectPoint,
}

impl NpcKind {
    /// Kinds that spawn groups only account for, never construct.
    pub fn is_excluded(self) -> bool {
        matches!(
            self,
            NpcKind::Pet | NpcKind::Decoy | NpcKind::Trap | NpcKind::EffectPoint
        )
    }

    pub fn is_monster(self) -> bool {
        matches!(
            self,
            NpcKind::Monster
                | NpcKind::RaidBoss
                | NpcKind::GrandBoss
                | NpcKind::Minion
                | NpcKind::FeedableBeast
                | NpcKind::Chest
        )
    }

    pub fn is_raid(self) -> bool {
        matches!(self, NpcKind::RaidBoss | NpcKind::GrandBoss)
    }

    /// Npcs that may carry the champion designation
    pub fn is_attackable(self) -> bool {
        self.is_monster() || matches!(self, NpcKind::Guard | NpcKind::SiegeGuard)
    }
}

/// Immutable description of an npc type, shared by every npc spawned from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcTemplate {
    pub id: TemplateId,
    pub kind: NpcKind,
    pub level: u8,
    pub max_hp: f64,
    pub max_mp: f64,
    #[serde(default)]
    pub quest_monster: bool,
    #[serde(default)]
    pub raid_minion: bool,
}

impl NpcTemplate {
    pub fn new(id: TemplateId, kind: NpcKind) -> Self {
        Self {
            id,
            kind,
            level: 1,
            max_hp: 100.,
            max_mp: 100.,
            quest_monster: false,
            raid_minion: false,
        }
    }
}

/// A live npc record.
///
/// The record outlives a single life of the npc: when it dies it is handed back to its spawn
/// group, which re-initializes and re-inserts it on respawn.
#[derive(Debug, Clone)]
pub struct Npc {
    pub id: ObjectId,
    pub template: Arc<NpcTemplate>,
    pub channel: ChannelId,
    pub position: WorldPosition,
    pub heading: i32,
    pub hp: f64,
    pub mp: f64,
    pub is_dead: bool,
    pub is_decayed: bool,
    pub script_value: i32,
    pub no_random_walk: bool,
    pub show_summon_animation: bool,
    pub champion: bool,
    /// Transient effects, cleared whenever the npc is (re)placed
    pub effects: Vec<String>,
    spawn: Option<Weak<SpawnGroup>>,
}

impl Npc {
    pub fn new(id: ObjectId, template: Arc<NpcTemplate>) -> Self {
        let hp = template.max_hp;
        let mp = template.max_mp;
        Self {
            id,
            template,
            channel: ChannelId::WORLD,
            position: WorldPosition::default(),
            heading: 0,
            hp,
            mp,
            is_dead: false,
            is_decayed: false,
            script_value: 0,
            no_random_walk: false,
            show_summon_animation: false,
            champion: false,
            effects: Vec::new(),
            spawn: None,
        }
    }

    pub fn template_id(&self) -> TemplateId {
        self.template.id
    }

    pub fn kind(&self) -> NpcKind {
        self.template.kind
    }

    pub fn level(&self) -> u8 {
        self.template.level
    }

    pub fn max_hp(&self) -> f64 {
        self.template.max_hp
    }

    pub fn max_mp(&self) -> f64 {
        self.template.max_mp
    }

    /// Give the npc a new object id, used when a dead npc record is brought back to life.
    pub fn refresh_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    /// The spawn group that owns this npc, if it is still alive.
    pub fn spawn_group(&self) -> Option<Arc<SpawnGroup>> {
        self.spawn.as_ref().and_then(Weak::upgrade)
    }

    pub fn has_spawn(&self) -> bool {
        self.spawn.is_some()
    }

    pub(crate) fn bind_spawn(&mut self, group: Weak<SpawnGroup>) {
        self.spawn = Some(group);
    }

    /// Detach the npc from its spawn group, returning the back-reference
    pub(crate) fn take_spawn(&mut self) -> Option<Weak<SpawnGroup>> {
        self.spawn.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excluded_kinds_are_not_monsters() {
        for kind in [NpcKind::Pet, NpcKind::Decoy, NpcKind::Trap, NpcKind::EffectPoint].iter() {
            assert!(kind.is_excluded());
            assert!(!kind.is_monster());
        }
        assert!(!NpcKind::Monster.is_excluded());
    }

    #[test]
    fn new_npc_starts_at_full_health() {
        let mut template = NpcTemplate::new(TemplateId(20001), NpcKind::Monster);
        template.max_hp = 250.;
        template.max_mp = 40.;
        let npc = Npc::new(ObjectId(1), Arc::new(template));
        assert_eq!(npc.hp, 250.);
        assert_eq!(npc.mp, 40.);
        assert!(npc.spawn_group().is_none());
    }

    #[test]
    fn template_deserializes_from_camel_case() {
        let template: NpcTemplate = serde_json::from_str(
            r#"{"id":21,"kind":"raidBoss","level":60,"maxHp":1000.0,"maxMp":200.0}"#,
        )
        .unwrap();
        assert_eq!(template.kind, NpcKind::RaidBoss);
        assert!(!template.quest_monster);
    }
}
