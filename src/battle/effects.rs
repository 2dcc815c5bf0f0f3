//! Hit effects
//!
//! Short-lived pooled markers spawned at impact points. They carry no
//! gameplay state; presentation layers read their positions while they
//! live, and each one times itself back into its pool.

use bevy::prelude::*;

use crate::combat::events::HitEffectRequestEvent;

use super::pool::{release_entity, EntityPools, Pooled, ReleaseOutcome};

/// Lifetime of a hit effect
const HIT_EFFECT_SECS: f32 = 0.5;

#[derive(Component, Debug, Clone, Copy)]
pub struct HitEffect {
    pub remaining: f32,
}

type EffectReuseQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut HitEffect,
        &'static mut Transform,
        &'static mut Pooled,
    ),
>;

/// Spawn requested hit effects from their pools
pub fn spawn_hit_effects(
    mut requests: EventReader<HitEffectRequestEvent>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut reusable: EffectReuseQuery,
) {
    for request in requests.read() {
        if !pools.has_pool(&request.key) {
            pools.create_pool(&request.key);
        }

        let mut reused = false;
        if let Some(entity) = pools.checkout(&request.key) {
            if let Ok((mut effect, mut transform, mut pooled)) = reusable.get_mut(entity) {
                effect.remaining = HIT_EFFECT_SECS;
                transform.translation = request.position.extend(0.0);
                pooled.active = true;
                reused = true;
            }
        }
        if !reused {
            commands.spawn((
                HitEffect {
                    remaining: HIT_EFFECT_SECS,
                },
                Transform::from_translation(request.position.extend(0.0)),
                Pooled::new(&request.key),
            ));
        }
    }
}

/// Tick hit effects and return expired ones to their pools
pub fn tick_hit_effects(
    time: Res<Time>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut effects: Query<(Entity, &mut HitEffect, &mut Pooled)>,
) {
    let dt = time.delta_secs();
    for (entity, mut effect, mut pooled) in effects.iter_mut() {
        if !pooled.active {
            continue;
        }
        effect.remaining -= dt;
        if effect.remaining > 0.0 {
            continue;
        }
        if release_entity(&mut pools, &mut pooled, entity) == ReleaseOutcome::Despawn {
            commands.entity(entity).despawn();
        }
    }
}
