//! Projectile skills
//!
//! Straight shots and lobbed arcs fired from the skill book. Projectiles
//! are pooled, pierce a limited number of enemies, and remember who they
//! already hit so one enemy is never struck twice by the same shot.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::events::{EnemyDamageEvent, SkillActivationEvent};

use super::super::components::{GameRng, PlayerTracker};
use super::super::data::{FireDirection, SkillKind};
use super::super::enemy::Enemy;
use super::super::player::GlobalStats;
use super::super::pool::{release_entity, EntityPools, Pooled, ReleaseOutcome};
use super::{alternating_offsets, rotate_deg, SkillBook};

pub const SKILL_PROJECTILE_POOL: &str = "skill_projectile";
const STRAIGHT_LIFETIME: f32 = 3.0;
const ARC_LIFETIME: f32 = 2.5;
const PROJECTILE_RADIUS: f32 = 0.3;
/// Downward acceleration applied to arcing shots
const GRAVITY: f32 = 25.0;
/// Spin speed of an arcing shot, degrees per second
const ARC_SPIN: f32 = 360.0;

/// How a projectile moves each frame
#[derive(Debug, Clone, Copy)]
pub enum Motion {
    Straight(Vec2),
    /// Ballistic arc; `vy` decays under gravity, spin is opposite the
    /// horizontal direction
    Arc { vx: f32, vy: f32, spin: f32 },
}

impl Motion {
    fn step(&self) -> Vec2 {
        match self {
            Motion::Straight(v) => *v,
            Motion::Arc { vx, vy, .. } => Vec2::new(*vx, *vy),
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct SkillProjectile {
    pub damage: f32,
    /// Enemies this shot can still hit before returning to its pool
    pub pierce_left: u32,
    pub motion: Motion,
    pub lifetime: f32,
    pub hit_effect: Option<String>,
    /// Enemies already struck by this shot
    pub recent_hits: SmallVec<[Entity; 8]>,
}

/// Aim and fan directions for one activation
pub fn shot_directions(
    direction: FireDirection,
    aim: Vec2,
    count: u32,
    spread_deg: f32,
) -> Vec<Vec2> {
    match direction {
        FireDirection::Nearest | FireDirection::Facing | FireDirection::Random => {
            alternating_offsets(count, spread_deg)
                .into_iter()
                .map(|off| rotate_deg(aim, off))
                .collect()
        }
        // A full fan fires to each side, doubling the shot count
        FireDirection::HorizontalBoth => {
            let mut dirs: Vec<Vec2> = alternating_offsets(count, spread_deg)
                .into_iter()
                .map(|off| rotate_deg(Vec2::X, off))
                .collect();
            dirs.extend(
                alternating_offsets(count, spread_deg)
                    .into_iter()
                    .map(|off| rotate_deg(Vec2::NEG_X, off)),
            );
            dirs
        }
    }
}

/// Initial arc motion for a lobbed shot. Flatter aim directions lob wider.
pub fn arc_motion(dir: Vec2, speed: f32) -> Motion {
    let spread_mult = 1.0 + (dir.y + 0.5) * 2.0;
    let vx = dir.x * spread_mult * speed * 0.5;
    Motion::Arc {
        vx,
        vy: speed,
        spin: if vx >= 0.0 { -ARC_SPIN } else { ARC_SPIN },
    }
}

type ProjectileReuseQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut SkillProjectile,
        &'static mut Transform,
        &'static mut Pooled,
    ),
>;

/// Materialize projectile activations as pooled shots
pub fn fire_projectiles(
    mut activations: EventReader<SkillActivationEvent>,
    book: Res<SkillBook>,
    stats: Res<GlobalStats>,
    tracker: Res<PlayerTracker>,
    mut rng: ResMut<GameRng>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut reusable: ProjectileReuseQuery,
) {
    for activation in activations.read() {
        let Some(skill) = book.slots.get(activation.slot) else {
            continue;
        };
        let SkillKind::Projectile {
            parabolic,
            direction,
        } = skill.def.kind
        else {
            continue;
        };
        let row = skill.row();

        let aim = match (direction, activation.target) {
            (FireDirection::Nearest, Some(target)) => {
                (target - tracker.position).normalize_or_zero()
            }
            (FireDirection::Random, _) => {
                Vec2::from_angle(rng.random_range(0.0, std::f32::consts::TAU))
            }
            _ => tracker.facing_dir(),
        };
        let aim = if aim == Vec2::ZERO {
            tracker.facing_dir()
        } else {
            aim
        };

        let damage = row.damage * stats.damage_mult;
        if !pools.has_pool(SKILL_PROJECTILE_POOL) {
            pools.create_pool(SKILL_PROJECTILE_POOL);
        }

        for dir in shot_directions(direction, aim, row.count.max(1), skill.def.spread_degrees) {
            let (motion, lifetime) = if parabolic {
                (arc_motion(dir, row.speed), ARC_LIFETIME)
            } else {
                (Motion::Straight(dir * row.speed), STRAIGHT_LIFETIME)
            };

            let mut reused = false;
            if let Some(entity) = pools.checkout(SKILL_PROJECTILE_POOL) {
                if let Ok((mut projectile, mut transform, mut pooled)) = reusable.get_mut(entity) {
                    projectile.damage = damage;
                    projectile.pierce_left = row.pierce.max(1);
                    projectile.motion = motion;
                    projectile.lifetime = lifetime;
                    projectile.hit_effect = skill.def.hit_effect.clone();
                    projectile.recent_hits.clear();
                    transform.translation = tracker.position.extend(0.0);
                    transform.rotation = Quat::IDENTITY;
                    pooled.active = true;
                    reused = true;
                }
            }
            if !reused {
                commands.spawn((
                    SkillProjectile {
                        damage,
                        pierce_left: row.pierce.max(1),
                        motion,
                        lifetime,
                        hit_effect: skill.def.hit_effect.clone(),
                        recent_hits: SmallVec::new(),
                    },
                    Transform::from_translation(tracker.position.extend(0.0)),
                    Pooled::new(SKILL_PROJECTILE_POOL),
                ));
            }
        }
    }
}

/// Advance projectiles and reclaim expired ones
pub fn move_skill_projectiles(
    time: Res<Time>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut SkillProjectile, &mut Transform, &mut Pooled)>,
) {
    let dt = time.delta_secs();
    for (entity, mut projectile, mut transform, mut pooled) in projectiles.iter_mut() {
        if !pooled.active {
            continue;
        }

        let step = projectile.motion.step() * dt;
        transform.translation += step.extend(0.0);
        if let Motion::Arc { vy, spin, .. } = &mut projectile.motion {
            *vy -= GRAVITY * dt;
            let spin = *spin;
            transform.rotate_z(spin.to_radians() * dt);
        }

        projectile.lifetime -= dt;
        if projectile.lifetime <= 0.0
            && release_entity(&mut pools, &mut pooled, entity) == ReleaseOutcome::Despawn
        {
            commands.entity(entity).despawn();
        }
    }
}

/// Collide projectiles with enemies
pub fn skill_projectile_hits(
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut SkillProjectile, &Transform, &mut Pooled)>,
    enemies: Query<(Entity, &Enemy, &Pooled, &Transform), Without<SkillProjectile>>,
    mut damage_events: EventWriter<EnemyDamageEvent>,
) {
    for (entity, mut projectile, transform, mut pooled) in projectiles.iter_mut() {
        if !pooled.active {
            continue;
        }
        let position = transform.translation.truncate();
        let knockback_dir = projectile.motion.step().normalize_or_zero();

        for (enemy_entity, enemy, enemy_pooled, enemy_transform) in enemies.iter() {
            if !enemy_pooled.active || enemy.is_dying() {
                continue;
            }
            if projectile.recent_hits.contains(&enemy_entity) {
                continue;
            }
            let dist = enemy_transform.translation.truncate().distance(position);
            if dist > PROJECTILE_RADIUS + enemy.stats.radius {
                continue;
            }

            projectile.recent_hits.push(enemy_entity);
            damage_events.send(EnemyDamageEvent {
                target: enemy_entity,
                amount: projectile.damage,
                knockback_dir,
                hit_effect_key: projectile.hit_effect.clone(),
            });

            projectile.pierce_left = projectile.pierce_left.saturating_sub(1);
            if projectile.pierce_left == 0 {
                break;
            }
        }

        if projectile.pierce_left == 0
            && release_entity(&mut pools, &mut pooled, entity) == ReleaseOutcome::Despawn
        {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_fan_leads_with_straight_shot() {
        let dirs = shot_directions(FireDirection::Nearest, Vec2::X, 2, 10.0);
        assert_eq!(dirs.len(), 2);
        assert!((dirs[0] - Vec2::X).length() < 1e-5);
        assert!((dirs[1].to_angle().to_degrees() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn horizontal_both_fires_a_full_fan_each_side() {
        let dirs = shot_directions(FireDirection::HorizontalBoth, Vec2::X, 2, 10.0);
        // Two shots per side, not two shots split between sides
        assert_eq!(dirs.len(), 4);
        assert!((dirs[0] - Vec2::X).length() < 1e-5);
        assert!((dirs[1].to_angle().to_degrees() - 10.0).abs() < 1e-3);
        assert!((dirs[2] - Vec2::NEG_X).length() < 1e-5);
        // Left fan rotated by +10 degrees lands at -170 in atan2 terms
        let left_angle = dirs[3].to_angle().to_degrees();
        assert!((left_angle + 170.0).abs() < 1e-3);
    }

    #[test]
    fn random_direction_fans_around_the_drawn_aim() {
        let aim = Vec2::from_angle(1.0);
        let dirs = shot_directions(FireDirection::Random, aim, 3, 10.0);
        assert_eq!(dirs.len(), 3);
        assert!((dirs[0] - aim).length() < 1e-5);
        assert!((dirs[1].to_angle() - dirs[0].to_angle() - 10.0_f32.to_radians()).abs() < 1e-3);
    }

    #[test]
    fn arc_motion_widens_with_flat_aim() {
        // Aim straight right: spread multiplier is 1 + 0.5 * 2 = 2
        let Motion::Arc { vx, vy, spin } = arc_motion(Vec2::X, 10.0) else {
            panic!("expected arc");
        };
        assert!((vx - 10.0).abs() < 1e-4);
        assert_eq!(vy, 10.0);
        // Spin opposes the horizontal direction
        assert!(spin < 0.0);

        let Motion::Arc { vx: left_vx, spin: left_spin, .. } = arc_motion(Vec2::NEG_X, 10.0) else {
            panic!("expected arc");
        };
        assert!(left_vx < 0.0);
        assert!(left_spin > 0.0);
    }
}
