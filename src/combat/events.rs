//! Combat events
//!
//! Typed notifications published by the simulation. External observers
//! (UI, audio, analytics) subscribe to these instead of holding references
//! into pooled entities, which keeps pool returns free of stale handlers.

use bevy::prelude::*;

use crate::battle::data::EnemyStats;

/// Fired whenever the player's health changes (damage or healing).
#[derive(Event)]
pub struct PlayerHealthChangedEvent {
    pub current: f32,
    pub max: f32,
}

/// Fired exactly once when the player's health reaches zero.
#[derive(Event)]
pub struct PlayerDiedEvent;

/// Fired once per level gained; a large experience pickup can emit several
/// of these in a single frame.
#[derive(Event)]
pub struct PlayerLeveledEvent {
    pub level: u32,
}

/// Request to grant experience to the player, emitted by pickups and boss
/// kills. Level resolution happens in one place so multi-level gains emit
/// one event per level crossed.
#[derive(Event)]
pub struct ExperienceGainedEvent {
    pub amount: f32,
}

/// Fired after experience is gained, with the progress toward the next level.
#[derive(Event)]
pub struct ExperienceChangedEvent {
    pub current: f32,
    pub required: f32,
}

/// Fired when any of the player's global multipliers (damage, cooldown,
/// area) changes. Auras and orbit bodies re-derive their stats from this.
#[derive(Event)]
pub struct GlobalStatsChangedEvent;

/// Request to damage an enemy. All skill hit paths funnel through this so
/// death handling and hit effects live in one place.
#[derive(Event)]
pub struct EnemyDamageEvent {
    pub target: Entity,
    pub amount: f32,
    /// Normalized knockback direction, or zero for no knockback.
    pub knockback_dir: Vec2,
    /// Pool key for the hit effect to spawn at the impact point, if any.
    pub hit_effect_key: Option<String>,
}

/// Fired when an enemy (or boss) takes fatal damage. The position and
/// reward drive the experience-gem spawner; the spawner also uses this to
/// unregister the entity from its tracking set.
#[derive(Event)]
pub struct EnemyDiedEvent {
    pub entity: Entity,
    pub position: Vec2,
    pub exp_reward: f32,
}

/// Fired when the wave driver advances to a new wave entry.
#[derive(Event)]
pub struct WaveChangedEvent {
    pub index: usize,
}

/// Fired when a scheduled boss enters the battle.
#[derive(Event)]
pub struct BossSpawnedEvent {
    pub name: String,
}

/// Fired when a skill is added to the skill book.
#[derive(Event)]
pub struct SkillAddedEvent {
    pub slot: usize,
    pub name: String,
}

/// Fired when a skill in the book gains a level.
#[derive(Event)]
pub struct SkillLeveledEvent {
    pub slot: usize,
    pub level: usize,
}

/// Internal: an active skill came off cooldown and passed its target check
/// this frame. Consumed by the delivery subsystems in the same frame.
#[derive(Event)]
pub struct SkillActivationEvent {
    pub slot: usize,
    /// Position of the acquired target, for skills that aim.
    pub target: Option<Vec2>,
}

/// Internal: spawn a pooled hit effect at a world position.
#[derive(Event)]
pub struct HitEffectRequestEvent {
    pub key: String,
    pub position: Vec2,
}

/// Internal: a boss summon pattern wants regular enemies spawned. The
/// spawner owns the enemy pool and tracking set, so it performs the spawn.
#[derive(Event)]
pub struct SummonRequestEvent {
    pub stats: EnemyStats,
    pub positions: Vec<Vec2>,
}

/// Internal: a boss projectile pattern fired a fan of shots.
#[derive(Event)]
pub struct VolleyRequestEvent {
    pub origin: Vec2,
    pub directions: Vec<Vec2>,
    pub speed: f32,
    pub damage: f32,
}
