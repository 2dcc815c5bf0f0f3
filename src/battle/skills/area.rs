//! Area skills
//!
//! Damage zones dropped at the player's feet. A zone ticks immediately
//! when placed, then on a fixed interval until its lifetime runs out.

use bevy::prelude::*;

use crate::combat::events::{EnemyDamageEvent, SkillActivationEvent};

use super::super::components::{overlap_circle, OverlapBuf, PlayerTracker};
use super::super::data::SkillKind;
use super::super::enemy::Enemy;
use super::super::player::GlobalStats;
use super::super::pool::{release_entity, EntityPools, Pooled, ReleaseOutcome};
use super::SkillBook;

pub const AREA_ZONE_POOL: &str = "area_zone";
/// Seconds between damage ticks
const TICK_INTERVAL: f32 = 0.5;

#[derive(Component, Debug, Clone)]
pub struct AreaZone {
    pub damage: f32,
    pub radius: f32,
    /// Remaining lifetime
    pub remaining: f32,
    /// Counts down to the next tick; zero at spawn so the first tick
    /// lands the moment the zone appears
    pub tick_timer: f32,
    pub hit_effect: Option<String>,
}

type ZoneReuseQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut AreaZone,
        &'static mut Transform,
        &'static mut Pooled,
    ),
>;

/// Place zones for area skill activations
pub fn place_area_zones(
    mut activations: EventReader<SkillActivationEvent>,
    book: Res<SkillBook>,
    stats: Res<GlobalStats>,
    tracker: Res<PlayerTracker>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut reusable: ZoneReuseQuery,
) {
    for activation in activations.read() {
        let Some(skill) = book.slots.get(activation.slot) else {
            continue;
        };
        if skill.def.kind != SkillKind::Area {
            continue;
        }
        // Zones drop where the player stands, enemies around or not
        let center = tracker.position;
        let row = skill.row();
        let zone = AreaZone {
            damage: row.damage * stats.damage_mult,
            radius: row.radius * stats.area_mult,
            remaining: row.duration,
            tick_timer: 0.0,
            hit_effect: skill.def.hit_effect.clone(),
        };

        if !pools.has_pool(AREA_ZONE_POOL) {
            pools.create_pool(AREA_ZONE_POOL);
        }
        let mut reused = false;
        if let Some(entity) = pools.checkout(AREA_ZONE_POOL) {
            if let Ok((mut existing, mut transform, mut pooled)) = reusable.get_mut(entity) {
                *existing = zone.clone();
                transform.translation = center.extend(0.0);
                pooled.active = true;
                reused = true;
            }
        }
        if !reused {
            commands.spawn((
                zone,
                Transform::from_translation(center.extend(0.0)),
                Pooled::new(AREA_ZONE_POOL),
            ));
        }
    }
}

/// Tick zones: damage enemies inside on each tick, reclaim expired zones
pub fn tick_area_zones(
    time: Res<Time>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut zones: Query<(Entity, &mut AreaZone, &Transform, &mut Pooled)>,
    enemies: Query<(Entity, &Enemy, &Pooled, &Transform), Without<AreaZone>>,
    mut damage_events: EventWriter<EnemyDamageEvent>,
) {
    let dt = time.delta_secs();
    let mut buf = OverlapBuf::new();

    for (entity, mut zone, transform, mut pooled) in zones.iter_mut() {
        if !pooled.active {
            continue;
        }

        zone.tick_timer -= dt;
        if zone.tick_timer <= 0.0 {
            zone.tick_timer += TICK_INTERVAL;

            let center = transform.translation.truncate();
            buf.clear();
            overlap_circle(
                enemies
                    .iter()
                    .filter(|(_, enemy, p, _)| p.active && !enemy.is_dying())
                    .map(|(e, _, _, t)| (e, t.translation.truncate())),
                center,
                zone.radius,
                &mut buf,
            );
            for (enemy_entity, enemy_pos) in buf.iter() {
                // Push away from the zone's center
                let knockback_dir = (*enemy_pos - center).normalize_or_zero();
                damage_events.send(EnemyDamageEvent {
                    target: *enemy_entity,
                    amount: zone.damage,
                    knockback_dir,
                    hit_effect_key: zone.hit_effect.clone(),
                });
            }
        }

        zone.remaining -= dt;
        if zone.remaining <= 0.0
            && release_entity(&mut pools, &mut pooled, entity) == ReleaseOutcome::Despawn
        {
            commands.entity(entity).despawn();
        }
    }
}
