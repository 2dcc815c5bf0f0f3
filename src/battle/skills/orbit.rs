//! Orbit skills
//!
//! Bodies circling the player at even spacing. Each body keeps a short
//! per-enemy hit cooldown so an enemy grazing the orbit ring takes damage
//! repeatedly but not every frame.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat::events::{
    EnemyDamageEvent, GlobalStatsChangedEvent, SkillAddedEvent, SkillLeveledEvent,
};

use super::super::components::PlayerTracker;
use super::super::data::SkillKind;
use super::super::enemy::Enemy;
use super::super::player::GlobalStats;
use super::super::pool::Pooled;
use super::SkillBook;

/// Seconds before the same body can hit the same enemy again
const HIT_COOLDOWN: f32 = 0.5;
/// Collision radius of an orbit body
const BODY_RADIUS: f32 = 0.5;

/// One body in a skill's orbit ring
#[derive(Component, Debug, Clone)]
pub struct OrbitBody {
    pub slot: usize,
    /// Position in the ring, `0..count`
    pub index: u32,
    pub damage: f32,
    /// Orbit radius around the player
    pub orbit_radius: f32,
    /// Degrees per second
    pub angular_speed: f32,
    /// Current angle in degrees
    pub angle: f32,
    /// Remaining per-enemy hit cooldowns
    pub hit_cooldowns: HashMap<Entity, f32>,
    pub hit_effect: Option<String>,
}

/// Evenly spaced angles for `count` bodies, starting from `phase` so a
/// respaced ring keeps its current rotation
pub fn respaced_angles(phase: f32, count: u32) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }
    let step = 360.0 / count as f32;
    (0..count)
        .map(|i| (phase + step * i as f32).rem_euclid(360.0))
        .collect()
}

/// Create, update, or remove orbit bodies when the book or stats change.
///
/// A count change keeps the existing bodies and respaces the ring around
/// them; only the missing bodies are spawned fresh.
pub fn sync_orbit_bodies(
    mut added: EventReader<SkillAddedEvent>,
    mut leveled: EventReader<SkillLeveledEvent>,
    mut stats_changed: EventReader<GlobalStatsChangedEvent>,
    book: Res<SkillBook>,
    stats: Res<GlobalStats>,
    mut commands: Commands,
    mut bodies: Query<(Entity, &mut OrbitBody)>,
) {
    let changed =
        added.read().count() + leveled.read().count() + stats_changed.read().count();
    if changed == 0 {
        return;
    }

    for (slot, skill) in book.slots.iter().enumerate() {
        if skill.def.kind != SkillKind::Orbit {
            continue;
        }
        let row = skill.row();
        let count = row.count.max(1);
        let damage = row.damage * stats.damage_mult;
        let orbit_radius = row.radius * stats.area_mult;
        let angular_speed = row.speed;

        let mut existing: Vec<(Entity, f32, u32)> = bodies
            .iter()
            .filter(|(_, b)| b.slot == slot)
            .map(|(e, b)| (e, b.angle, b.index))
            .collect();
        existing.sort_by_key(|(_, _, index)| *index);

        if existing.len() == count as usize {
            for (_, mut body) in bodies.iter_mut() {
                if body.slot == slot {
                    body.damage = damage;
                    body.orbit_radius = orbit_radius;
                    body.angular_speed = angular_speed;
                }
            }
            continue;
        }

        // Count changed: respace the ring from its current rotation,
        // keeping the bodies already in flight
        let phase = existing.first().map(|(_, angle, _)| *angle).unwrap_or(0.0);
        for (i, angle) in respaced_angles(phase, count).into_iter().enumerate() {
            match existing.get(i) {
                Some((entity, _, _)) => {
                    if let Ok((_, mut body)) = bodies.get_mut(*entity) {
                        body.index = i as u32;
                        body.angle = angle;
                        body.damage = damage;
                        body.orbit_radius = orbit_radius;
                        body.angular_speed = angular_speed;
                    }
                }
                None => {
                    commands.spawn((
                        OrbitBody {
                            slot,
                            index: i as u32,
                            damage,
                            orbit_radius,
                            angular_speed,
                            angle,
                            hit_cooldowns: HashMap::new(),
                            hit_effect: skill.def.hit_effect.clone(),
                        },
                        Transform::default(),
                    ));
                }
            }
        }
        for (entity, _, _) in existing.iter().skip(count as usize) {
            commands.entity(*entity).despawn();
        }
    }
}

/// Spin the bodies around the player and damage enemies they touch
pub fn tick_orbits(
    time: Res<Time>,
    tracker: Res<PlayerTracker>,
    mut bodies: Query<(&mut OrbitBody, &mut Transform)>,
    enemies: Query<(Entity, &Enemy, &Pooled, &Transform), Without<OrbitBody>>,
    mut damage_events: EventWriter<EnemyDamageEvent>,
) {
    let dt = time.delta_secs();

    for (mut body, mut transform) in bodies.iter_mut() {
        body.angle = (body.angle + body.angular_speed * dt).rem_euclid(360.0);
        let offset = Vec2::from_angle(body.angle.to_radians()) * body.orbit_radius;
        let position = tracker.position + offset;
        transform.translation = position.extend(0.0);

        // Tick down per-enemy cooldowns, dropping the expired ones
        for cooldown in body.hit_cooldowns.values_mut() {
            *cooldown -= dt;
        }
        body.hit_cooldowns.retain(|_, cd| *cd > 0.0);

        for (enemy_entity, enemy, enemy_pooled, enemy_transform) in enemies.iter() {
            if !enemy_pooled.active || enemy.is_dying() {
                continue;
            }
            if body.hit_cooldowns.contains_key(&enemy_entity) {
                continue;
            }
            let enemy_pos = enemy_transform.translation.truncate();
            if enemy_pos.distance(position) > BODY_RADIUS + enemy.stats.radius {
                continue;
            }

            body.hit_cooldowns.insert(enemy_entity, HIT_COOLDOWN);
            damage_events.send(EnemyDamageEvent {
                target: enemy_entity,
                amount: body.damage,
                knockback_dir: (enemy_pos - tracker.position).normalize_or_zero(),
                hit_effect_key: body.hit_effect.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respaced_angles_are_evenly_spaced() {
        assert_eq!(respaced_angles(0.0, 4), vec![0.0, 90.0, 180.0, 270.0]);
        assert_eq!(respaced_angles(0.0, 1), vec![0.0]);
        assert!(respaced_angles(0.0, 0).is_empty());
    }

    #[test]
    fn respaced_angles_keep_the_current_rotation() {
        assert_eq!(respaced_angles(37.0, 3), vec![37.0, 157.0, 277.0]);
        // Wraps past 360
        let wrapped = respaced_angles(300.0, 2);
        assert_eq!(wrapped[0], 300.0);
        assert!((wrapped[1] - 60.0).abs() < 1e-4);
    }
}
