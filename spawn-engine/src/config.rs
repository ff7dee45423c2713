use serde_derive::{Deserialize, Serialize};
use std::str::FromStr;

/// Global spawn settings shared by every group of a world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpawnConfig {
    /// Correct exact spawn points to the ground height. Area spawns are always corrected.
    pub geodata_enabled: bool,
    pub champion: ChampionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChampionConfig {
    pub enabled: bool,
    pub min_level: u8,
    pub max_level: u8,
    /// Chance in percent for an eligible npc to spawn as a champion
    pub frequency: u8,
    pub enable_in_instances: bool,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            geodata_enabled: env_or("SPAWN_GEODATA", false),
            champion: ChampionConfig::default(),
        }
    }
}

impl Default for ChampionConfig {
    fn default() -> Self {
        Self {
            enabled: env_or("SPAWN_CHAMPION_ENABLE", false),
            min_level: env_or("SPAWN_CHAMPION_MIN_LEVEL", 20),
            max_level: env_or("SPAWN_CHAMPION_MAX_LEVEL", 60),
            frequency: env_or("SPAWN_CHAMPION_FREQUENCY", 0),
            enable_in_instances: false,
        }
    }
}

impl SpawnConfig {
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let conf = SpawnConfig::from_json(r#"{"champion":{"enabled":true,"frequency":5}}"#)
            .unwrap();
        assert!(conf.champion.enabled);
        assert_eq!(conf.champion.frequency, 5);
        assert!(conf.champion.min_level <= conf.champion.max_level);
        assert!(!conf.champion.enable_in_instances);
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(SpawnConfig::from_json(r#"{"geodataEnabled":"yes"}"#).is_err());
    }
}
