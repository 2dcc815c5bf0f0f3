//! Shared components and resources for the battle simulation

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use smallvec::SmallVec;

/// Maximum hits returned by a single overlap query. Matches the fixed-size
/// scratch buffer used by area and aura skills.
pub const MAX_OVERLAP_HITS: usize = 32;

/// Buffer of (entity, position) pairs produced by [`overlap_circle`].
pub type OverlapBuf = SmallVec<[(Entity, Vec2); MAX_OVERLAP_HITS]>;

/// Seeded random number generator for deterministic battle simulation.
///
/// When a seed is provided (e.g., via headless config), the same seed will
/// always produce the same battle outcome. Without a seed, uses system entropy.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Pick a random index in `0..len`
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Random point on the circle of the given radius around a center
    pub fn random_on_circle(&mut self, center: Vec2, radius: f32) -> Vec2 {
        let angle = self.random_range(0.0, std::f32::consts::TAU);
        center + Vec2::from_angle(angle) * radius
    }

    /// Uniform random point inside the disk of the given radius. The sqrt
    /// keeps the distribution uniform by area rather than bunched at the
    /// center.
    pub fn random_in_circle(&mut self, center: Vec2, radius: f32) -> Vec2 {
        let r = radius * self.random_f32().sqrt();
        let angle = self.random_range(0.0, std::f32::consts::TAU);
        center + Vec2::from_angle(angle) * r
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Linear velocity in world units per second. Integrated once per frame
/// during the combat-and-movement phase.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec2);

/// Snapshot of the player's state for this frame.
///
/// Updated once during the upkeep phase so every downstream system (enemy
/// chase, skill aiming, relocation, magnet) reads the same position rather
/// than a mid-frame mix of old and new values.
#[derive(Resource, Debug, Clone)]
pub struct PlayerTracker {
    pub position: Vec2,
    /// Raw movement input direction for this frame (may be zero).
    pub move_direction: Vec2,
    /// Last non-zero horizontal facing. Starts facing right.
    pub facing_right: bool,
    pub alive: bool,
}

impl Default for PlayerTracker {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            move_direction: Vec2::ZERO,
            facing_right: true,
            alive: false,
        }
    }
}

impl PlayerTracker {
    /// Horizontal facing as a unit direction on the X axis
    pub fn facing_dir(&self) -> Vec2 {
        if self.facing_right {
            Vec2::X
        } else {
            Vec2::NEG_X
        }
    }
}

/// Collect all entities from `iter` within `radius` of `center`.
///
/// Results are appended to `buf` in iteration order and silently truncated
/// at [`MAX_OVERLAP_HITS`]. The caller clears the buffer between queries.
pub fn overlap_circle(
    iter: impl Iterator<Item = (Entity, Vec2)>,
    center: Vec2,
    radius: f32,
    buf: &mut OverlapBuf,
) {
    let radius_sq = radius * radius;
    for (entity, pos) in iter {
        if buf.len() >= MAX_OVERLAP_HITS {
            break;
        }
        if pos.distance_squared(center) <= radius_sq {
            buf.push((entity, pos));
        }
    }
}

/// Find the entity nearest to `center` within `radius`, ties broken by
/// iteration order.
pub fn nearest_in_circle(
    iter: impl Iterator<Item = (Entity, Vec2)>,
    center: Vec2,
    radius: f32,
) -> Option<(Entity, Vec2)> {
    let radius_sq = radius * radius;
    let mut best: Option<(Entity, Vec2, f32)> = None;
    for (entity, pos) in iter {
        let dist_sq = pos.distance_squared(center);
        if dist_sq > radius_sq {
            continue;
        }
        match best {
            Some((_, _, best_sq)) if dist_sq >= best_sq => {}
            _ => best = Some((entity, pos, dist_sq)),
        }
    }
    best.map(|(entity, pos, _)| (entity, pos))
}

/// Integrate [`Velocity`] into transforms
pub fn integrate_velocity(time: Res<Time>, mut query: Query<(&Velocity, &mut Transform)>) {
    let dt = time.delta_secs();
    for (velocity, mut transform) in query.iter_mut() {
        transform.translation.x += velocity.0.x * dt;
        transform.translation.y += velocity.0.y * dt;
    }
}
