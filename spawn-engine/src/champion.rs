//! Champion (elite) designation of freshly placed npcs.
//!
use crate::config::ChampionConfig;
use crate::indices::ChannelId;
use crate::npc::Npc;
use rand::Rng;

/// Decides whether a freshly placed npc becomes a champion.
pub trait ChampionPolicy: Send + Sync {
    fn roll(&self, npc: &Npc, channel: ChannelId) -> bool;
}

/// Never designates champions
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChampions;

impl ChampionPolicy for NoChampions {
    fn roll(&self, _: &Npc, _: ChannelId) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct ConfiguredChampionPolicy {
    pub config: ChampionConfig,
}

impl ConfiguredChampionPolicy {
    pub fn new(config: ChampionConfig) -> Self {
        Self { config }
    }

    pub fn is_eligible(&self, npc: &Npc, channel: ChannelId) -> bool {
        let conf = &self.config;
        let template = &npc.template;
        conf.enabled
            && conf.frequency > 0
            && template.kind.is_monster()
            && !template.kind.is_raid()
            && !template.raid_minion
            && !template.quest_monster
            && conf.min_level <= template.level
            && template.level <= conf.max_level
            && (conf.enable_in_instances || !channel.is_instanced())
    }
}

impl ChampionPolicy for ConfiguredChampionPolicy {
    fn roll(&self, npc: &Npc, channel: ChannelId) -> bool {
        self.is_eligible(npc, channel)
            && rand::thread_rng().gen_range(0, 100) < u32::from(self.config.frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::{ObjectId, TemplateId};
    use crate::npc::{NpcKind, NpcTemplate};
    use std::sync::Arc;

    fn config() -> ChampionConfig {
        ChampionConfig {
            enabled: true,
            min_level: 20,
            max_level: 60,
            frequency: 100,
            enable_in_instances: false,
        }
    }

    fn npc(kind: NpcKind, level: u8) -> Npc {
        let mut template = NpcTemplate::new(TemplateId(1), kind);
        template.level = level;
        Npc::new(ObjectId(1), Arc::new(template))
    }

    #[test]
    fn full_frequency_always_rolls_eligible_monsters() {
        let policy = ConfiguredChampionPolicy::new(config());
        for _ in 0..32 {
            assert!(policy.roll(&npc(NpcKind::Monster, 40), ChannelId::WORLD));
        }
    }

    #[test]
    fn ineligible_npcs_never_roll() {
        let policy = ConfiguredChampionPolicy::new(config());
        assert!(!policy.roll(&npc(NpcKind::Merchant, 40), ChannelId::WORLD));
        assert!(!policy.roll(&npc(NpcKind::RaidBoss, 40), ChannelId::WORLD));
        assert!(!policy.roll(&npc(NpcKind::Monster, 19), ChannelId::WORLD));
        assert!(!policy.roll(&npc(NpcKind::Monster, 61), ChannelId::WORLD));
        assert!(!policy.roll(&npc(NpcKind::Monster, 40), ChannelId(3)));

        let mut quest = npc(NpcKind::Monster, 40);
        Arc::make_mut(&mut quest.template).quest_monster = true;
        assert!(!policy.roll(&quest, ChannelId::WORLD));
    }

    #[test]
    fn instances_are_allowed_when_configured() {
        let mut conf = config();
        conf.enable_in_instances = true;
        let policy = ConfiguredChampionPolicy::new(conf);
        assert!(policy.roll(&npc(NpcKind::Monster, 40), ChannelId(3)));
    }

    #[test]
    fn disabled_config_never_rolls() {
        let mut conf = config();
        conf.enabled = false;
        let policy = ConfiguredChampionPolicy::new(conf);
        assert!(!policy.roll(&npc(NpcKind::Monster, 40), ChannelId::WORLD));
    }
}
