//! Enemy spawning and relocation
//!
//! Spawns wave enemies on a ring around the player and teleports enemies
//! that fall too far behind to a band ahead of the player's movement, so a
//! moving player never outruns the horde.

use bevy::prelude::*;
use std::collections::BTreeSet;

use crate::combat::events::SummonRequestEvent;

use super::components::{GameRng, PlayerTracker, Velocity};
use super::data::{EnemyStats, GameData};
use super::enemy::{reset_enemy, Enemy};
use super::health::{Health, HitReaction, HitTimers};
use super::pool::{EntityPools, Pooled};
use super::waves::WaveState;

/// Inner and outer radius of the spawn ring around the player
pub const SPAWN_RING_MIN: f32 = 15.0;
pub const SPAWN_RING_MAX: f32 = 25.0;
/// Enemies farther than this from the player get relocated
pub const RELOCATE_DISTANCE: f32 = 30.0;
/// Relocated enemies land this far ahead of the player
pub const RELOCATE_AHEAD: f32 = 30.0;
/// Sideways spread of the relocation band
pub const RELOCATE_SPREAD: f32 = 15.0;
/// Small jitter so relocated enemies do not stack on one point
pub const RELOCATE_JITTER: f32 = 0.5;

/// All enemy and boss entities currently simulating.
///
/// Kept alongside the `Pooled::active` flags so systems that need the full
/// enemy set (relocation, skills) iterate a set instead of filtering the
/// whole world. Ordered so seeded battles replay identically.
#[derive(Resource, Default)]
pub struct ActiveEnemies {
    entities: BTreeSet<Entity>,
}

impl ActiveEnemies {
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity);
    }

    pub fn remove(&mut self, entity: Entity) {
        self.entities.remove(&entity);
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Copy of the set, for iteration while mutating membership
    pub fn snapshot(&self) -> Vec<Entity> {
        self.entities.iter().copied().collect()
    }
}

pub type EnemyReuseQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Enemy,
        &'static mut Health,
        &'static mut HitTimers,
        &'static mut Velocity,
        &'static mut Transform,
        &'static mut Pooled,
    ),
>;

/// Activate an enemy at a position, reusing a pooled entity when one is idle
pub fn spawn_enemy_at(
    commands: &mut Commands,
    pools: &mut EntityPools,
    active: &mut ActiveEnemies,
    reusable: &mut EnemyReuseQuery,
    stats: &EnemyStats,
    position: Vec2,
) -> Entity {
    if !pools.has_pool(&stats.name) {
        pools.create_pool(&stats.name);
    }

    if let Some(entity) = pools.checkout(&stats.name) {
        if let Ok((mut enemy, mut health, mut timers, mut velocity, mut transform, mut pooled)) =
            reusable.get_mut(entity)
        {
            reset_enemy(
                stats,
                position,
                &mut enemy,
                &mut health,
                &mut timers,
                &mut velocity,
                &mut transform,
                &mut pooled,
            );
            active.insert(entity);
            return entity;
        }
    }

    let entity = commands
        .spawn((
            Enemy::new(stats.clone()),
            Health::new(stats.max_health),
            HitTimers::default(),
            HitReaction::default(),
            Velocity::default(),
            Transform::from_translation(position.extend(0.0)),
            Pooled::new(&stats.name),
        ))
        .id();
    active.insert(entity);
    entity
}

/// Where a relocated enemy lands relative to the player. A stationary
/// player relocates along the default facing instead of onto themselves.
pub fn relocated_position(player_pos: Vec2, move_dir: Vec2, side_offset: f32, jitter: Vec2) -> Vec2 {
    let dir = if move_dir == Vec2::ZERO {
        Vec2::X
    } else {
        move_dir.normalize_or_zero()
    };
    let ahead = dir * RELOCATE_AHEAD;
    let side = dir.perp() * side_offset;
    player_pos + ahead + side + jitter
}

/// Spawn wave enemies on the ring around the player
pub fn spawn_wave_enemies(
    time: Res<Time>,
    data: Res<GameData>,
    tracker: Res<PlayerTracker>,
    mut wave_state: ResMut<WaveState>,
    mut rng: ResMut<GameRng>,
    mut pools: ResMut<EntityPools>,
    mut active: ResMut<ActiveEnemies>,
    mut commands: Commands,
    mut reusable: EnemyReuseQuery,
) {
    let Some(wave_index) = wave_state.current else {
        return;
    };
    let wave = &data.waves[wave_index];
    if wave.enemies.is_empty() {
        return;
    }

    wave_state.spawn_timer -= time.delta_secs();
    if wave_state.spawn_timer > 0.0 {
        return;
    }
    wave_state.spawn_timer = wave.spawn_interval;

    // Each interval tick spawns the wave's full batch
    for _ in 0..wave.spawn_count.max(1) {
        let name = &wave.enemies[rng.random_index(wave.enemies.len())];
        let Some(stats) = data.enemy(name) else {
            continue;
        };
        let radius = rng.random_range(SPAWN_RING_MIN, SPAWN_RING_MAX);
        let position = rng.random_on_circle(tracker.position, radius);
        let stats = stats.clone();
        spawn_enemy_at(
            &mut commands,
            &mut pools,
            &mut active,
            &mut reusable,
            &stats,
            position,
        );
    }
}

/// Spawn boss-summoned enemies at the requested positions
pub fn handle_summon_requests(
    mut requests: EventReader<SummonRequestEvent>,
    mut pools: ResMut<EntityPools>,
    mut active: ResMut<ActiveEnemies>,
    mut commands: Commands,
    mut reusable: EnemyReuseQuery,
) {
    for request in requests.read() {
        for position in &request.positions {
            spawn_enemy_at(
                &mut commands,
                &mut pools,
                &mut active,
                &mut reusable,
                &request.stats,
                *position,
            );
        }
    }
}

/// Teleport far-away enemies into the band ahead of the player.
///
/// Bosses are never relocated. While the player stands still the band
/// falls along the default facing.
pub fn relocate_distant_enemies(
    tracker: Res<PlayerTracker>,
    active: Res<ActiveEnemies>,
    mut rng: ResMut<GameRng>,
    mut query: Query<(&Enemy, &Pooled, &mut Transform), Without<super::boss::BossBrain>>,
) {
    for entity in active.snapshot() {
        let Ok((enemy, pooled, mut transform)) = query.get_mut(entity) else {
            continue;
        };
        if !pooled.active || enemy.is_dying() {
            continue;
        }
        let pos = transform.translation.truncate();
        if pos.distance(tracker.position) <= RELOCATE_DISTANCE {
            continue;
        }
        let side = rng.random_range(-RELOCATE_SPREAD, RELOCATE_SPREAD);
        let jitter = Vec2::new(
            rng.random_range(-RELOCATE_JITTER, RELOCATE_JITTER),
            rng.random_range(-RELOCATE_JITTER, RELOCATE_JITTER),
        );
        let new_pos = relocated_position(tracker.position, tracker.move_direction, side, jitter);
        transform.translation = new_pos.extend(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocated_enemies_land_ahead_of_movement() {
        let player = Vec2::new(10.0, 5.0);
        let dir = Vec2::X;
        let pos = relocated_position(player, dir, 0.0, Vec2::ZERO);
        assert_eq!(pos, Vec2::new(10.0 + RELOCATE_AHEAD, 5.0));
    }

    #[test]
    fn stationary_player_relocates_along_default_facing() {
        let player = Vec2::new(2.0, 2.0);
        let pos = relocated_position(player, Vec2::ZERO, 0.0, Vec2::ZERO);
        assert_eq!(pos, Vec2::new(2.0 + RELOCATE_AHEAD, 2.0));
    }

    #[test]
    fn side_offset_is_perpendicular_to_movement() {
        let player = Vec2::ZERO;
        let pos = relocated_position(player, Vec2::X, RELOCATE_SPREAD, Vec2::ZERO);
        assert_eq!(pos.x, RELOCATE_AHEAD);
        assert_eq!(pos.y, RELOCATE_SPREAD);
    }

    #[test]
    fn active_set_tracks_membership() {
        let mut active = ActiveEnemies::default();
        let e = Entity::from_raw(5);
        active.insert(e);
        assert!(active.contains(e));
        assert_eq!(active.len(), 1);
        active.remove(e);
        assert!(active.is_empty());
    }
}
