//! Enemy behavior
//!
//! Regular enemies chase the player and damage on contact. All incoming
//! damage funnels through [`apply_enemy_damage`] so knockback, death, hit
//! effects, and pool returns behave the same for every damage source.

use bevy::prelude::*;

use crate::combat::events::{
    EnemyDamageEvent, EnemyDiedEvent, HitEffectRequestEvent, PlayerHealthChangedEvent,
};
use crate::combat::log::{BattleLog, BattleLogEventType};

use super::boss::BossBrain;
use super::components::{PlayerTracker, Velocity};
use super::data::EnemyStats;
use super::health::{deal_damage, DamageResult, Health, HitReaction, HitTimers};
use super::player::{player_hit_reaction, Player, PlayerProgress};
use super::pool::{release_entity, EntityPools, Pooled};
use super::spawner::ActiveEnemies;

/// How long a dead enemy stays in the world before returning to its pool.
/// Gives presentation layers time to play a death animation.
pub const DEATH_LINGER_SECS: f32 = 0.5;

/// Per-enemy state
#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub stats: EnemyStats,
    /// Remaining death-linger time, or None while alive
    pub dying: Option<f32>,
}

impl Enemy {
    pub fn new(stats: EnemyStats) -> Self {
        Self { stats, dying: None }
    }

    pub fn is_dying(&self) -> bool {
        self.dying.is_some()
    }
}

/// Reset a pooled enemy entity for reuse at a new position
pub fn reset_enemy(
    stats: &EnemyStats,
    position: Vec2,
    enemy: &mut Enemy,
    health: &mut Health,
    timers: &mut HitTimers,
    velocity: &mut Velocity,
    transform: &mut Transform,
    pooled: &mut Pooled,
) {
    enemy.stats = stats.clone();
    enemy.dying = None;
    *health = Health::new(stats.max_health);
    *timers = HitTimers::default();
    velocity.0 = Vec2::ZERO;
    transform.translation = position.extend(0.0);
    pooled.active = true;
}

/// Chase the player. Suppressed while in knockback, while dying, and for
/// bosses (the pattern machine owns boss movement).
pub fn enemy_chase(
    tracker: Res<PlayerTracker>,
    mut query: Query<(&Enemy, &Pooled, &HitTimers, &Transform, &mut Velocity), Without<BossBrain>>,
) {
    for (enemy, pooled, timers, transform, mut velocity) in query.iter_mut() {
        if !pooled.active || enemy.is_dying() {
            continue;
        }
        if timers.in_knockback() {
            continue;
        }
        if !tracker.alive {
            velocity.0 = Vec2::ZERO;
            continue;
        }
        let to_player = tracker.position - transform.translation.truncate();
        velocity.0 = to_player.normalize_or_zero() * enemy.stats.move_speed;
    }
}

/// Damage the player on contact. The player's invincibility window keeps a
/// crowd from draining health in a single frame.
pub fn enemy_contact_damage(
    tracker: Res<PlayerTracker>,
    enemies: Query<(&Enemy, &Pooled, &Transform)>,
    mut player: Query<(&mut Health, &mut HitTimers), With<Player>>,
    mut health_events: EventWriter<PlayerHealthChangedEvent>,
    mut log: ResMut<BattleLog>,
) {
    let Ok((mut health, mut timers)) = player.get_single_mut() else {
        return;
    };
    if !tracker.alive {
        return;
    }

    // Player contact radius
    const PLAYER_RADIUS: f32 = 0.5;
    let reaction = player_hit_reaction();

    for (enemy, pooled, transform) in enemies.iter() {
        if !pooled.active || enemy.is_dying() {
            continue;
        }
        let dist = transform.translation.truncate().distance(tracker.position);
        if dist > enemy.stats.radius + PLAYER_RADIUS {
            continue;
        }
        match deal_damage(&mut health, &mut timers, &reaction, enemy.stats.contact_damage) {
            DamageResult::Ignored => {}
            result => {
                health_events.send(PlayerHealthChangedEvent {
                    current: health.current,
                    max: health.max,
                });
                log.log(
                    BattleLogEventType::Damage,
                    format!(
                        "{} hit the player for {:.0}",
                        enemy.stats.name, enemy.stats.contact_damage
                    ),
                );
                if result == DamageResult::Died {
                    break;
                }
            }
        }
    }
}

/// Apply queued damage to enemies and bosses
pub fn apply_enemy_damage(
    mut damage_events: EventReader<EnemyDamageEvent>,
    mut enemies: Query<(
        &mut Enemy,
        &mut Health,
        &mut HitTimers,
        &HitReaction,
        &mut Velocity,
        &Transform,
        &Pooled,
    )>,
    mut died_events: EventWriter<EnemyDiedEvent>,
    mut effect_events: EventWriter<HitEffectRequestEvent>,
    mut progress: ResMut<PlayerProgress>,
    mut log: ResMut<BattleLog>,
) {
    for event in damage_events.read() {
        let Ok((mut enemy, mut health, mut timers, reaction, mut velocity, transform, pooled)) =
            enemies.get_mut(event.target)
        else {
            continue;
        };
        if !pooled.active || enemy.is_dying() {
            continue;
        }

        let result = deal_damage(&mut health, &mut timers, reaction, event.amount);
        if result == DamageResult::Ignored {
            continue;
        }

        let position = transform.translation.truncate();
        if let Some(key) = &event.hit_effect_key {
            effect_events.send(HitEffectRequestEvent {
                key: key.clone(),
                position,
            });
        }
        log.log(
            BattleLogEventType::Damage,
            format!("{} took {:.0} damage", enemy.stats.name, event.amount),
        );

        match result {
            DamageResult::Damaged => {
                if reaction.knockback_force > 0.0 {
                    velocity.0 = event.knockback_dir * reaction.knockback_force;
                }
            }
            DamageResult::Died => {
                enemy.dying = Some(DEATH_LINGER_SECS);
                velocity.0 = Vec2::ZERO;
                progress.kills += 1;
                died_events.send(EnemyDiedEvent {
                    entity: event.target,
                    position,
                    exp_reward: enemy.stats.exp_reward,
                });
                log.log(
                    BattleLogEventType::Death,
                    format!("{} died", enemy.stats.name),
                );
            }
            DamageResult::Ignored => unreachable!(),
        }
    }
}

/// Tick death-linger timers and return finished enemies to their pools
pub fn finish_enemy_deaths(
    time: Res<Time>,
    mut commands: Commands,
    mut pools: ResMut<EntityPools>,
    mut active: ResMut<ActiveEnemies>,
    mut query: Query<(Entity, &mut Enemy, &mut Pooled)>,
) {
    let dt = time.delta_secs();
    for (entity, mut enemy, mut pooled) in query.iter_mut() {
        let Some(remaining) = enemy.dying else {
            continue;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            enemy.dying = Some(remaining);
            continue;
        }
        enemy.dying = None;
        active.remove(entity);
        if release_entity(&mut pools, &mut pooled, entity) == super::pool::ReleaseOutcome::Despawn {
            commands.entity(entity).despawn();
        }
    }
}
