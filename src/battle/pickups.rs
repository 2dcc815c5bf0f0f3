//! Experience gems
//!
//! Dead enemies drop pooled gems. Gems inside the player's magnet radius
//! fly to the player; once a gem starts flying it never stops, even if the
//! player moves out of range.

use bevy::prelude::*;

use crate::combat::events::{EnemyDiedEvent, ExperienceGainedEvent};

use super::components::{PlayerTracker, Velocity};
use super::pool::{release_entity, EntityPools, Pooled, ReleaseOutcome};

pub const GEM_POOL: &str = "exp_gem";
/// Gems inside this radius start flying to the player
pub const MAGNET_RADIUS: f32 = 3.0;
/// Flight speed of a magnetized gem
pub const PULL_SPEED: f32 = 15.0;
/// Distance at which a gem is collected
const COLLECT_RADIUS: f32 = 0.5;

/// A dropped experience gem
#[derive(Component, Debug, Clone, Copy)]
pub struct ExpGem {
    pub value: f32,
    /// Set once the magnet catches the gem
    pub pulled: bool,
}

type GemReuseQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut ExpGem,
        &'static mut Transform,
        &'static mut Pooled,
    ),
>;

/// Drop a gem wherever an enemy died
pub fn spawn_gems_on_death(
    mut deaths: EventReader<EnemyDiedEvent>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut reusable: GemReuseQuery,
) {
    for death in deaths.read() {
        if death.exp_reward <= 0.0 {
            continue;
        }
        if !pools.has_pool(GEM_POOL) {
            pools.create_pool(GEM_POOL);
        }

        let mut reused = false;
        if let Some(entity) = pools.checkout(GEM_POOL) {
            if let Ok((mut gem, mut transform, mut pooled)) = reusable.get_mut(entity) {
                gem.value = death.exp_reward;
                gem.pulled = false;
                transform.translation = death.position.extend(0.0);
                pooled.active = true;
                reused = true;
            }
        }
        if !reused {
            commands.spawn((
                ExpGem {
                    value: death.exp_reward,
                    pulled: false,
                },
                Transform::from_translation(death.position.extend(0.0)),
                Velocity::default(),
                Pooled::new(GEM_POOL),
            ));
        }
    }
}

/// Pull magnetized gems toward the player and collect the ones that arrive
pub fn magnet_gems(
    time: Res<Time>,
    tracker: Res<PlayerTracker>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut gems: Query<(Entity, &mut ExpGem, &mut Transform, &mut Pooled)>,
    mut exp_events: EventWriter<ExperienceGainedEvent>,
) {
    if !tracker.alive {
        return;
    }
    let dt = time.delta_secs();
    for (entity, mut gem, mut transform, mut pooled) in gems.iter_mut() {
        if !pooled.active {
            continue;
        }
        let pos = transform.translation.truncate();
        let dist = pos.distance(tracker.position);

        if !gem.pulled && dist <= MAGNET_RADIUS {
            gem.pulled = true;
        }
        if !gem.pulled {
            continue;
        }

        if dist <= COLLECT_RADIUS {
            exp_events.send(ExperienceGainedEvent { amount: gem.value });
            if release_entity(&mut pools, &mut pooled, entity) == ReleaseOutcome::Despawn {
                commands.entity(entity).despawn();
            }
            continue;
        }

        let step = (tracker.position - pos).normalize_or_zero() * PULL_SPEED * dt;
        // Never overshoot the player in one frame
        let step = if step.length() > dist {
            tracker.position - pos
        } else {
            step
        };
        transform.translation += step.extend(0.0);
    }
}
