//! Player character
//!
//! Movement, experience and leveling, and the global stat multipliers that
//! passives and character definitions feed into every skill.

use bevy::prelude::*;

use crate::combat::events::{
    ExperienceChangedEvent, ExperienceGainedEvent, PlayerDiedEvent, PlayerHealthChangedEvent,
    PlayerLeveledEvent,
};
use crate::combat::log::{BattleLog, BattleLogEventType};

use super::components::{PlayerTracker, Velocity};
use super::data::PlayerDef;
use super::flow::BattlePhase;
use super::health::{heal, Health, HitReaction, HitTimers};

pub const MAX_LEVEL: u32 = 99;
/// Extra max health granted per level
const HEALTH_PER_LEVEL: f32 = 10.0;

/// Marker for the player entity
#[derive(Component)]
pub struct Player {
    /// Base move speed from the character definition
    pub move_speed: f32,
}

/// Movement intent for this frame, written by input or by the headless
/// wander behavior
#[derive(Resource, Debug, Default)]
pub struct PlayerInput {
    pub direction: Vec2,
}

/// Experience required to go from `level` to `level + 1`
pub fn exp_required(level: u32) -> f32 {
    100.0 * 1.2_f32.powi(level.saturating_sub(1) as i32)
}

/// Level and experience progress
#[derive(Resource, Debug)]
pub struct PlayerProgress {
    pub level: u32,
    pub exp: f32,
    pub kills: u32,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            level: 1,
            exp: 0.0,
            kills: 0,
        }
    }
}

/// Global multipliers applied on top of every skill's numbers.
///
/// Seeded from the character definition; passive skills add their bonuses
/// on top and announce changes so long-lived skill bodies can re-derive.
#[derive(Resource, Debug, Clone)]
pub struct GlobalStats {
    pub damage_mult: f32,
    pub cooldown_mult: f32,
    pub area_mult: f32,
    pub move_speed_mult: f32,
    pub bonus_max_health: f32,
}

impl GlobalStats {
    pub fn from_character(def: &PlayerDef) -> Self {
        Self {
            damage_mult: def.damage_mult,
            cooldown_mult: def.cooldown_mult,
            area_mult: def.area_mult,
            move_speed_mult: 1.0,
            bonus_max_health: 0.0,
        }
    }
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self {
            damage_mult: 1.0,
            cooldown_mult: 1.0,
            area_mult: 1.0,
            move_speed_mult: 1.0,
            bonus_max_health: 0.0,
        }
    }
}

/// Player hit reaction: longer invincibility than enemies, no knockback
pub fn player_hit_reaction() -> HitReaction {
    HitReaction {
        knockback_force: 0.0,
        knockback_duration: 0.0,
        invincibility: 0.5,
        flash_duration: 0.1,
    }
}

/// Apply movement intent to the player's velocity
pub fn move_player(
    input: Res<PlayerInput>,
    stats: Res<GlobalStats>,
    mut query: Query<(&Player, &Health, &mut Velocity)>,
) {
    for (player, health, mut velocity) in query.iter_mut() {
        if !health.is_alive() {
            velocity.0 = Vec2::ZERO;
            continue;
        }
        let dir = input.direction.normalize_or_zero();
        velocity.0 = dir * player.move_speed * stats.move_speed_mult;
    }
}

/// Snapshot the player's position and facing for this frame
pub fn update_player_tracker(
    input: Res<PlayerInput>,
    mut tracker: ResMut<PlayerTracker>,
    query: Query<(&Transform, &Health), With<Player>>,
) {
    if let Ok((transform, health)) = query.get_single() {
        tracker.position = transform.translation.truncate();
        tracker.move_direction = input.direction.normalize_or_zero();
        tracker.alive = health.is_alive();
        if input.direction.x > 0.0 {
            tracker.facing_right = true;
        } else if input.direction.x < 0.0 {
            tracker.facing_right = false;
        }
    }
}

/// Outcome of applying experience, for the event emitters
pub struct ExpGain {
    pub levels_gained: Vec<u32>,
    pub exp: f32,
    pub required: f32,
}

/// Add experience and resolve level-ups one at a time.
///
/// A large gain can cross several thresholds in one call; each crossing is
/// reported individually so observers see every level. At the level cap
/// further experience accumulates but no more levels are gained.
pub fn grant_experience(progress: &mut PlayerProgress, amount: f32) -> ExpGain {
    progress.exp += amount;
    let mut levels_gained = Vec::new();
    while progress.level < MAX_LEVEL && progress.exp >= exp_required(progress.level) {
        progress.exp -= exp_required(progress.level);
        progress.level += 1;
        levels_gained.push(progress.level);
    }
    ExpGain {
        levels_gained,
        exp: progress.exp,
        required: exp_required(progress.level),
    }
}

/// Consume experience pickups, level the player, and grow max health
pub fn apply_experience(
    mut gains: EventReader<ExperienceGainedEvent>,
    mut progress: ResMut<PlayerProgress>,
    mut leveled: EventWriter<PlayerLeveledEvent>,
    mut exp_changed: EventWriter<ExperienceChangedEvent>,
    mut health_changed: EventWriter<PlayerHealthChangedEvent>,
    mut log: ResMut<BattleLog>,
    mut query: Query<&mut Health, With<Player>>,
) {
    let mut total = 0.0;
    for gain in gains.read() {
        total += gain.amount;
    }
    if total <= 0.0 {
        return;
    }

    let result = grant_experience(&mut progress, total);
    exp_changed.send(ExperienceChangedEvent {
        current: result.exp,
        required: result.required,
    });

    if result.levels_gained.is_empty() {
        return;
    }

    for level in &result.levels_gained {
        leveled.send(PlayerLeveledEvent { level: *level });
        log.log(BattleLogEventType::LevelUp, format!("Reached level {}", level));
    }

    if let Ok(mut health) = query.get_single_mut() {
        let bonus = HEALTH_PER_LEVEL * result.levels_gained.len() as f32;
        health.max += bonus;
        heal(&mut health, bonus);
        health_changed.send(PlayerHealthChangedEvent {
            current: health.current,
            max: health.max,
        });
    }
}

/// End the battle when the player dies
pub fn check_player_death(
    mut phase: ResMut<BattlePhase>,
    mut died: EventWriter<PlayerDiedEvent>,
    mut log: ResMut<BattleLog>,
    query: Query<&Health, With<Player>>,
) {
    if let Ok(health) = query.get_single() {
        if !health.is_alive() && phase.end() {
            died.send(PlayerDiedEvent);
            log.log(BattleLogEventType::Death, "Player died".to_string());
        }
    }
}
