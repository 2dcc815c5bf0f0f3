//! Data-driven battle definitions
//!
//! Enemies, bosses, skills, characters, and waves are plain records loaded
//! from a RON catalog (`assets/config/battle.ron`). Balance changes do not
//! require recompilation; the builtin catalog below is the fallback when no
//! config file is present and is what the tests run against.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

fn default_pierce() -> u32 {
    1
}

fn default_radius() -> f32 {
    0.5
}

fn default_spawn_count() -> u32 {
    1
}

fn default_recovery() -> f32 {
    0.3
}

/// Stats for a regular enemy type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Display name, also used as the pool key
    pub name: String,
    pub max_health: f32,
    /// Chase speed in units per second
    pub move_speed: f32,
    /// Damage dealt to the player on contact
    pub contact_damage: f32,
    /// Experience dropped on death
    pub exp_reward: f32,
    /// Collision radius
    #[serde(default = "default_radius")]
    pub radius: f32,
}

/// One attack archetype a boss can perform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BossPatternKind {
    /// Telegraph for `windup_secs`, then dash along the direction to the
    /// player captured at the end of the windup
    Charge {
        windup_secs: f32,
        speed: f32,
        duration_secs: f32,
    },
    /// Fire a fan of projectiles centered on the direction to the player
    Volley {
        count: u32,
        spread_degrees: f32,
        speed: f32,
        damage: f32,
    },
    /// Spawn regular enemies in a ring around the boss
    Summon {
        /// Name of the enemy type in the catalog
        enemy: String,
        count: u32,
        radius: f32,
    },
    /// Telegraph, then damage everything in a circle around the boss
    Slam {
        windup_secs: f32,
        radius: f32,
        damage: f32,
    },
}

/// A pattern plus its selection cooldown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackPattern {
    pub kind: BossPatternKind,
    /// Seconds between selections of this pattern. The timer resets when
    /// the pattern is selected, not when it finishes.
    pub cooldown: f32,
    /// Pause after the pattern finishes before the boss acts again
    #[serde(default = "default_recovery")]
    pub recovery_secs: f32,
}

/// A boss definition: enemy stats plus an attack pattern list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossDef {
    pub stats: EnemyStats,
    pub patterns: Vec<AttackPattern>,
}

/// How an active skill chooses its firing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireDirection {
    /// Toward the nearest enemy; the skill skips its activation if no
    /// enemy is in range
    Nearest,
    /// Along the player's horizontal facing
    Facing,
    /// A full fan to each side, regardless of facing
    HorizontalBoth,
    /// A fresh random direction on every activation
    Random,
}

/// What a skill does when it activates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillKind {
    /// Straight or arcing projectiles
    Projectile {
        #[serde(default)]
        parabolic: bool,
        direction: FireDirection,
    },
    /// A damage zone dropped at the player's feet that ticks while it lasts
    Area,
    /// A permanent zone following the player that ticks on an interval
    Aura,
    /// Bodies circling the player, damaging enemies they touch
    Orbit,
    /// No activation; permanently modifies a global player stat
    Passive { stat: PassiveStat },
}

/// Player stat modified by a passive skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassiveStat {
    /// Multiplies all skill damage
    Damage,
    /// Divides all skill cooldowns
    Cooldown,
    /// Multiplies all skill areas and projectile sizes
    Area,
    /// Multiplies player move speed
    MoveSpeed,
    /// Adds flat maximum health
    MaxHealth,
}

/// Per-level numbers for a skill. Fields a given kind does not use are
/// left at their defaults in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SkillLevelRow {
    #[serde(default)]
    pub damage: f32,
    /// Projectile/orbit body count
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub cooldown: f32,
    /// Zone or orbit radius
    #[serde(default)]
    pub radius: f32,
    /// Projectile or orbit angular speed
    #[serde(default)]
    pub speed: f32,
    /// Zone lifetime or tick interval, depending on kind
    #[serde(default)]
    pub duration: f32,
    /// Enemies a projectile can hit before returning to its pool
    #[serde(default = "default_pierce")]
    pub pierce: u32,
    /// Passive magnitude (e.g. 0.1 for +10%)
    #[serde(default)]
    pub value: f32,
}

/// A complete skill definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    pub kind: SkillKind,
    /// Angle between successive shots in a multi-shot activation
    #[serde(default)]
    pub spread_degrees: f32,
    /// Pool key for the hit effect spawned on impact
    #[serde(default)]
    pub hit_effect: Option<String>,
    /// One row per level; `levels.len()` is the skill's maximum level
    pub levels: Vec<SkillLevelRow>,
}

impl SkillDef {
    pub fn max_level(&self) -> usize {
        self.levels.len()
    }

    /// Row for a 1-based level, clamped to the last row
    pub fn row(&self, level: usize) -> &SkillLevelRow {
        let idx = level.saturating_sub(1).min(self.levels.len() - 1);
        &self.levels[idx]
    }
}

/// A playable character: base stats plus global multipliers applied on top
/// of skill numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDef {
    pub name: String,
    pub max_health: f32,
    pub move_speed: f32,
    #[serde(default = "one")]
    pub damage_mult: f32,
    #[serde(default = "one")]
    pub cooldown_mult: f32,
    #[serde(default = "one")]
    pub area_mult: f32,
    /// Gold required to unlock this character; zero means free
    #[serde(default)]
    pub unlock_cost: i64,
    /// Skills granted at battle start, by catalog name
    #[serde(default)]
    pub starting_skills: Vec<String>,
}

fn one() -> f32 {
    1.0
}

/// One wave in the spawn schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveEntry {
    /// Battle time at which this wave becomes current
    pub start_time: f32,
    /// Seconds between spawns while this wave is current
    pub spawn_interval: f32,
    /// Enemies spawned on each interval tick
    #[serde(default = "default_spawn_count")]
    pub spawn_count: u32,
    /// Enemy types spawned by this wave, picked uniformly at random
    pub enemies: Vec<String>,
}

/// One scheduled boss appearance. Entries fire exactly once, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossEntry {
    /// Battle time at which the boss spawns
    pub spawn_time: f32,
    /// Boss name in the catalog
    pub boss: String,
}

/// The full battle catalog
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub characters: Vec<PlayerDef>,
    pub enemies: Vec<EnemyStats>,
    pub bosses: Vec<BossDef>,
    pub skills: Vec<SkillDef>,
    pub waves: Vec<WaveEntry>,
    /// Scheduled boss appearances, in ascending spawn time
    pub boss_entries: Vec<BossEntry>,
}

impl GameData {
    pub fn character(&self, name: &str) -> Option<&PlayerDef> {
        self.characters.iter().find(|c| c.name == name)
    }

    pub fn enemy(&self, name: &str) -> Option<&EnemyStats> {
        self.enemies.iter().find(|e| e.name == name)
    }

    pub fn skill(&self, name: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.name == name)
    }

    pub fn boss(&self, name: &str) -> Option<&BossDef> {
        self.bosses.iter().find(|b| b.stats.name == name)
    }

    /// Load a catalog from a RON file
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path, e))?;
        let data: GameData =
            ron::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))?;
        data.validate()?;
        Ok(data)
    }

    /// Check cross-references and basic sanity
    pub fn validate(&self) -> Result<(), String> {
        if self.characters.is_empty() {
            return Err("Catalog must define at least one character".to_string());
        }
        if self.waves.is_empty() {
            return Err("Catalog must define at least one wave".to_string());
        }
        for skill in &self.skills {
            if skill.levels.is_empty() {
                return Err(format!("Skill '{}' has no level rows", skill.name));
            }
        }
        for wave in &self.waves {
            for name in &wave.enemies {
                if self.enemy(name).is_none() {
                    return Err(format!("Wave references unknown enemy '{}'", name));
                }
            }
        }
        for boss in &self.bosses {
            for pattern in &boss.patterns {
                if let BossPatternKind::Summon { enemy, .. } = &pattern.kind {
                    if self.enemy(enemy).is_none() {
                        return Err(format!(
                            "Boss '{}' summons unknown enemy '{}'",
                            boss.stats.name, enemy
                        ));
                    }
                }
            }
        }
        for entry in &self.boss_entries {
            if self.boss(&entry.boss).is_none() {
                return Err(format!("Boss schedule references unknown boss '{}'", entry.boss));
            }
        }
        for pair in self.boss_entries.windows(2) {
            if pair[1].spawn_time < pair[0].spawn_time {
                return Err("Boss schedule must be in ascending spawn_time order".to_string());
            }
        }
        for character in &self.characters {
            for name in &character.starting_skills {
                if self.skill(name).is_none() {
                    return Err(format!(
                        "Character '{}' starts with unknown skill '{}'",
                        character.name, name
                    ));
                }
            }
        }
        Ok(())
    }

    /// The builtin catalog used when no config file is provided
    pub fn builtin() -> Self {
        let enemies = vec![
            EnemyStats {
                name: "Slime".to_string(),
                max_health: 10.0,
                move_speed: 2.0,
                contact_damage: 5.0,
                exp_reward: 1.0,
                radius: 0.5,
            },
            EnemyStats {
                name: "Bat".to_string(),
                max_health: 6.0,
                move_speed: 3.5,
                contact_damage: 3.0,
                exp_reward: 1.0,
                radius: 0.4,
            },
            EnemyStats {
                name: "Skeleton".to_string(),
                max_health: 25.0,
                move_speed: 1.8,
                contact_damage: 10.0,
                exp_reward: 3.0,
                radius: 0.5,
            },
        ];

        let bosses = vec![
            BossDef {
                stats: EnemyStats {
                    name: "Stone Golem".to_string(),
                    max_health: 500.0,
                    move_speed: 1.2,
                    contact_damage: 20.0,
                    exp_reward: 50.0,
                    radius: 1.2,
                },
                patterns: vec![
                    AttackPattern {
                        kind: BossPatternKind::Charge {
                            windup_secs: 1.0,
                            speed: 12.0,
                            duration_secs: 0.6,
                        },
                        cooldown: 6.0,
                        recovery_secs: 0.5,
                    },
                    AttackPattern {
                        kind: BossPatternKind::Slam {
                            windup_secs: 1.2,
                            radius: 4.0,
                            damage: 25.0,
                        },
                        cooldown: 8.0,
                        recovery_secs: 0.5,
                    },
                ],
            },
            BossDef {
                stats: EnemyStats {
                    name: "Lich".to_string(),
                    max_health: 800.0,
                    move_speed: 1.5,
                    contact_damage: 15.0,
                    exp_reward: 80.0,
                    radius: 0.9,
                },
                patterns: vec![
                    AttackPattern {
                        kind: BossPatternKind::Volley {
                            count: 5,
                            spread_degrees: 15.0,
                            speed: 8.0,
                            damage: 12.0,
                        },
                        cooldown: 4.0,
                        recovery_secs: 0.3,
                    },
                    AttackPattern {
                        kind: BossPatternKind::Summon {
                            enemy: "Skeleton".to_string(),
                            count: 4,
                            radius: 3.0,
                        },
                        cooldown: 10.0,
                        recovery_secs: 0.3,
                    },
                ],
            },
        ];

        let skills = vec![
            SkillDef {
                name: "Fire Bolt".to_string(),
                kind: SkillKind::Projectile {
                    parabolic: false,
                    direction: FireDirection::Nearest,
                },
                spread_degrees: 10.0,
                hit_effect: Some("hit_spark".to_string()),
                levels: vec![
                    SkillLevelRow { damage: 10.0, count: 1, cooldown: 1.5, speed: 12.0, pierce: 1, ..Default::default() },
                    SkillLevelRow { damage: 12.0, count: 2, cooldown: 1.5, speed: 12.0, pierce: 1, ..Default::default() },
                    SkillLevelRow { damage: 14.0, count: 2, cooldown: 1.3, speed: 12.0, pierce: 2, ..Default::default() },
                    SkillLevelRow { damage: 16.0, count: 3, cooldown: 1.2, speed: 13.0, pierce: 2, ..Default::default() },
                    SkillLevelRow { damage: 20.0, count: 4, cooldown: 1.0, speed: 14.0, pierce: 3, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Throwing Axe".to_string(),
                kind: SkillKind::Projectile {
                    parabolic: true,
                    direction: FireDirection::Facing,
                },
                spread_degrees: 0.0,
                hit_effect: Some("hit_spark".to_string()),
                levels: vec![
                    SkillLevelRow { damage: 18.0, count: 1, cooldown: 2.5, speed: 10.0, pierce: 3, ..Default::default() },
                    SkillLevelRow { damage: 22.0, count: 2, cooldown: 2.5, speed: 10.0, pierce: 3, ..Default::default() },
                    SkillLevelRow { damage: 26.0, count: 2, cooldown: 2.2, speed: 11.0, pierce: 4, ..Default::default() },
                    SkillLevelRow { damage: 32.0, count: 3, cooldown: 2.0, speed: 11.0, pierce: 5, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Scorch Zone".to_string(),
                kind: SkillKind::Area,
                hit_effect: None,
                spread_degrees: 0.0,
                levels: vec![
                    SkillLevelRow { damage: 5.0, cooldown: 4.0, radius: 2.0, duration: 3.0, ..Default::default() },
                    SkillLevelRow { damage: 7.0, cooldown: 4.0, radius: 2.5, duration: 3.5, ..Default::default() },
                    SkillLevelRow { damage: 9.0, cooldown: 3.5, radius: 3.0, duration: 4.0, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Chaos Sparks".to_string(),
                kind: SkillKind::Projectile {
                    parabolic: false,
                    direction: FireDirection::Random,
                },
                spread_degrees: 15.0,
                hit_effect: Some("hit_spark".to_string()),
                levels: vec![
                    SkillLevelRow { damage: 6.0, count: 2, cooldown: 1.2, speed: 10.0, pierce: 1, ..Default::default() },
                    SkillLevelRow { damage: 8.0, count: 3, cooldown: 1.1, speed: 10.0, pierce: 1, ..Default::default() },
                    SkillLevelRow { damage: 10.0, count: 4, cooldown: 1.0, speed: 11.0, pierce: 2, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Frost Aura".to_string(),
                kind: SkillKind::Aura,
                hit_effect: Some("frost_nip".to_string()),
                spread_degrees: 0.0,
                levels: vec![
                    SkillLevelRow { damage: 3.0, radius: 2.0, duration: 0.5, ..Default::default() },
                    SkillLevelRow { damage: 4.0, radius: 2.3, duration: 0.5, ..Default::default() },
                    SkillLevelRow { damage: 6.0, radius: 2.6, duration: 0.4, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Orbiting Blades".to_string(),
                kind: SkillKind::Orbit,
                hit_effect: Some("hit_spark".to_string()),
                spread_degrees: 0.0,
                levels: vec![
                    SkillLevelRow { damage: 8.0, count: 2, radius: 2.0, speed: 180.0, ..Default::default() },
                    SkillLevelRow { damage: 10.0, count: 3, radius: 2.0, speed: 200.0, ..Default::default() },
                    SkillLevelRow { damage: 12.0, count: 4, radius: 2.2, speed: 220.0, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Whetstone".to_string(),
                kind: SkillKind::Passive {
                    stat: PassiveStat::Damage,
                },
                hit_effect: None,
                spread_degrees: 0.0,
                levels: vec![
                    SkillLevelRow { value: 0.10, ..Default::default() },
                    SkillLevelRow { value: 0.20, ..Default::default() },
                    SkillLevelRow { value: 0.30, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Hourglass".to_string(),
                kind: SkillKind::Passive {
                    stat: PassiveStat::Cooldown,
                },
                hit_effect: None,
                spread_degrees: 0.0,
                levels: vec![
                    SkillLevelRow { value: 0.08, ..Default::default() },
                    SkillLevelRow { value: 0.16, ..Default::default() },
                    SkillLevelRow { value: 0.24, ..Default::default() },
                ],
            },
            SkillDef {
                name: "Wide Lens".to_string(),
                kind: SkillKind::Passive {
                    stat: PassiveStat::Area,
                },
                hit_effect: None,
                spread_degrees: 0.0,
                levels: vec![
                    SkillLevelRow { value: 0.10, ..Default::default() },
                    SkillLevelRow { value: 0.20, ..Default::default() },
                ],
            },
        ];

        let characters = vec![
            PlayerDef {
                name: "Knight".to_string(),
                max_health: 100.0,
                move_speed: 4.0,
                damage_mult: 1.0,
                cooldown_mult: 1.0,
                area_mult: 1.0,
                unlock_cost: 0,
                starting_skills: vec!["Fire Bolt".to_string()],
            },
            PlayerDef {
                name: "Pyromancer".to_string(),
                max_health: 80.0,
                move_speed: 4.2,
                damage_mult: 1.2,
                cooldown_mult: 0.9,
                area_mult: 1.1,
                unlock_cost: 500,
                starting_skills: vec!["Scorch Zone".to_string()],
            },
        ];

        let waves = vec![
            WaveEntry {
                start_time: 0.0,
                spawn_interval: 2.0,
                spawn_count: 1,
                enemies: vec!["Slime".to_string()],
            },
            WaveEntry {
                start_time: 30.0,
                spawn_interval: 1.5,
                spawn_count: 2,
                enemies: vec!["Slime".to_string(), "Bat".to_string()],
            },
            WaveEntry {
                start_time: 90.0,
                spawn_interval: 1.0,
                spawn_count: 3,
                enemies: vec![
                    "Slime".to_string(),
                    "Bat".to_string(),
                    "Skeleton".to_string(),
                ],
            },
        ];

        let boss_entries = vec![
            BossEntry {
                spawn_time: 60.0,
                boss: "Stone Golem".to_string(),
            },
            BossEntry {
                spawn_time: 180.0,
                boss: "Lich".to_string(),
            },
        ];

        GameData {
            characters,
            enemies,
            bosses,
            skills,
            waves,
            boss_entries,
        }
    }
}

impl Default for GameData {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_validates() {
        assert!(GameData::builtin().validate().is_ok());
    }

    #[test]
    fn skill_row_clamps_to_last_level() {
        let data = GameData::builtin();
        let skill = data.skill("Fire Bolt").unwrap();
        let last = skill.max_level();
        assert_eq!(skill.row(last + 5).damage, skill.row(last).damage);
        // Level 0 requests clamp to the first row
        assert_eq!(skill.row(0).damage, skill.levels[0].damage);
    }

    #[test]
    fn validate_rejects_unknown_wave_enemy() {
        let mut data = GameData::builtin();
        data.waves[0].enemies.push("Dragon".to_string());
        assert!(data.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_summon_enemy() {
        let mut data = GameData::builtin();
        for boss in &mut data.bosses {
            for pattern in &mut boss.patterns {
                if let BossPatternKind::Summon { enemy, .. } = &mut pattern.kind {
                    *enemy = "Ghost".to_string();
                }
            }
        }
        assert!(data.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_scheduled_boss() {
        let mut data = GameData::builtin();
        data.boss_entries.push(BossEntry {
            spawn_time: 300.0,
            boss: "Bone Colossus".to_string(),
        });
        assert!(data.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_order_boss_schedule() {
        let mut data = GameData::builtin();
        data.boss_entries.reverse();
        assert!(data.validate().is_err());
    }

    #[test]
    fn shipped_catalog_matches_builtin() {
        let shipped = GameData::load_from_file("assets/config/battle.ron").unwrap();
        let builtin = GameData::builtin();
        assert_eq!(shipped.characters.len(), builtin.characters.len());
        assert_eq!(shipped.enemies.len(), builtin.enemies.len());
        assert_eq!(shipped.bosses.len(), builtin.bosses.len());
        assert_eq!(shipped.skills.len(), builtin.skills.len());
        assert_eq!(shipped.waves.len(), builtin.waves.len());
        assert_eq!(shipped.boss_entries.len(), builtin.boss_entries.len());
        for (a, b) in shipped.skills.iter().zip(&builtin.skills) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.max_level(), b.max_level());
        }
    }

    #[test]
    fn catalog_round_trips_through_ron() {
        let data = GameData::builtin();
        let text = ron::ser::to_string_pretty(&data, ron::ser::PrettyConfig::default()).unwrap();
        let back: GameData = ron::from_str(&text).unwrap();
        assert!(back.validate().is_ok());
        assert_eq!(back.skills.len(), data.skills.len());
    }
}
