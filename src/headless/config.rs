//! JSON configuration parsing for headless mode
//!
//! Parses JSON battle configurations and validates them against the battle
//! catalog before a battle starts.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::battle::data::GameData;

/// Headless battle configuration loaded from JSON
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessBattleConfig {
    /// Character name from the catalog (default: "Knight")
    #[serde(default = "default_character")]
    pub character: String,
    /// Extra skills granted at battle start, on top of the character's
    /// starting skills
    #[serde(default)]
    pub skills: Vec<String>,
    /// Maximum battle duration in seconds (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic battle reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the battle log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// RON catalog to load instead of the builtin one (optional)
    #[serde(default)]
    pub catalog_path: Option<String>,
}

fn default_character() -> String {
    "Knight".to_string()
}

fn default_max_duration() -> f32 {
    300.0
}

impl Default for HeadlessBattleConfig {
    fn default() -> Self {
        Self {
            character: default_character(),
            skills: Vec::new(),
            max_duration_secs: default_max_duration(),
            random_seed: None,
            output_path: None,
            catalog_path: None,
        }
    }
}

impl HeadlessBattleConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: HeadlessBattleConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate_basic()?;
        Ok(config)
    }

    /// Checks that do not need the catalog
    fn validate_basic(&self) -> Result<(), String> {
        if self.character.trim().is_empty() {
            return Err("character must not be empty".to_string());
        }
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }
        Ok(())
    }

    /// Resolve the catalog this battle runs against
    pub fn load_catalog(&self) -> Result<GameData, String> {
        match &self.catalog_path {
            Some(path) => GameData::load_from_file(path),
            None => Ok(GameData::builtin()),
        }
    }

    /// Validate the configuration against a catalog
    pub fn validate_against(&self, data: &GameData) -> Result<(), String> {
        self.validate_basic()?;

        if data.character(&self.character).is_none() {
            let known: Vec<&str> = data.characters.iter().map(|c| c.name.as_str()).collect();
            return Err(format!(
                "Unknown character: '{}'. Valid characters: {}",
                self.character,
                known.join(", ")
            ));
        }
        for skill in &self.skills {
            if data.skill(skill).is_none() {
                return Err(format!("Unknown skill: '{}'", skill));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_against_builtin_catalog() {
        let config = HeadlessBattleConfig::default();
        let data = GameData::builtin();
        assert!(config.validate_against(&data).is_ok());
    }

    #[test]
    fn unknown_character_is_rejected() {
        let config = HeadlessBattleConfig {
            character: "Nobody".to_string(),
            ..Default::default()
        };
        let err = config.validate_against(&GameData::builtin()).unwrap_err();
        assert!(err.contains("Unknown character"));
    }

    #[test]
    fn unknown_skill_is_rejected() {
        let config = HeadlessBattleConfig {
            skills: vec!["Kamehameha".to_string()],
            ..Default::default()
        };
        let err = config.validate_against(&GameData::builtin()).unwrap_err();
        assert!(err.contains("Unknown skill"));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let config = HeadlessBattleConfig {
            max_duration_secs: 0.0,
            ..Default::default()
        };
        assert!(config.validate_against(&GameData::builtin()).is_err());
    }

    #[test]
    fn minimal_json_parses_with_defaults() {
        let config: HeadlessBattleConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.character, "Knight");
        assert_eq!(config.max_duration_secs, 300.0);
        assert!(config.skills.is_empty());
        assert!(config.random_seed.is_none());
    }
}
