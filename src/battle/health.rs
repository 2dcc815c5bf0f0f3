//! Health and hit reactions
//!
//! Shared damage model for everything that can be hurt. Damage is applied
//! through [`deal_damage`] so invincibility windows, clamping, and death
//! detection behave identically for the player, enemies, and bosses.

use bevy::prelude::*;

/// Current and maximum hit points
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Restore to full, e.g. when a pooled entity is reused
    pub fn refill(&mut self) {
        self.current = self.max;
    }
}

/// Per-entity countdown timers started by a hit
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HitTimers {
    /// Remaining invincibility in seconds; damage is ignored while positive
    pub invincible: f32,
    /// Remaining knockback time; movement AI is suppressed while positive
    pub knockback: f32,
    /// Remaining damage-flash time, for presentation layers
    pub flash: f32,
}

impl HitTimers {
    pub fn tick(&mut self, dt: f32) {
        self.invincible = (self.invincible - dt).max(0.0);
        self.knockback = (self.knockback - dt).max(0.0);
        self.flash = (self.flash - dt).max(0.0);
    }

    pub fn in_knockback(&self) -> bool {
        self.knockback > 0.0
    }
}

/// How an entity reacts to taking a hit
#[derive(Component, Debug, Clone, Copy)]
pub struct HitReaction {
    /// Impulse speed applied away from the damage source
    pub knockback_force: f32,
    /// How long the knockback impulse lasts
    pub knockback_duration: f32,
    /// Invincibility window started by each hit
    pub invincibility: f32,
    /// Damage-flash duration for presentation
    pub flash_duration: f32,
}

impl Default for HitReaction {
    fn default() -> Self {
        Self {
            knockback_force: 5.0,
            knockback_duration: 0.1,
            invincibility: 0.2,
            flash_duration: 0.1,
        }
    }
}

/// Outcome of a [`deal_damage`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageResult {
    /// Target was invincible or already dead; nothing changed
    Ignored,
    /// Damage applied, target still alive
    Damaged,
    /// This hit reduced health to zero
    Died,
}

/// Apply damage to a target, honoring its invincibility window and starting
/// its hit timers.
///
/// `Died` is reported only for the hit that crosses zero; further hits on a
/// dead target are `Ignored`.
pub fn deal_damage(
    health: &mut Health,
    timers: &mut HitTimers,
    reaction: &HitReaction,
    amount: f32,
) -> DamageResult {
    if !health.is_alive() || timers.invincible > 0.0 {
        return DamageResult::Ignored;
    }

    health.current = (health.current - amount).max(0.0);
    timers.invincible = reaction.invincibility;
    timers.knockback = reaction.knockback_duration;
    timers.flash = reaction.flash_duration;

    if health.is_alive() {
        DamageResult::Damaged
    } else {
        DamageResult::Died
    }
}

/// Heal a target, clamped to max health. Dead targets cannot be healed.
pub fn heal(health: &mut Health, amount: f32) -> f32 {
    if !health.is_alive() {
        return 0.0;
    }
    let before = health.current;
    health.current = (health.current + amount).min(health.max);
    health.current - before
}

/// Tick down all hit timers
pub fn tick_hit_timers(time: Res<Time>, mut query: Query<&mut HitTimers>) {
    let dt = time.delta_secs();
    for mut timers in query.iter_mut() {
        timers.tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_at_zero_and_reports_death_once() {
        let mut health = Health::new(10.0);
        let mut timers = HitTimers::default();
        let reaction = HitReaction::default();

        assert_eq!(
            deal_damage(&mut health, &mut timers, &reaction, 25.0),
            DamageResult::Died
        );
        assert_eq!(health.current, 0.0);

        // Dead targets ignore further hits
        timers.invincible = 0.0;
        assert_eq!(
            deal_damage(&mut health, &mut timers, &reaction, 5.0),
            DamageResult::Ignored
        );
    }

    #[test]
    fn invincibility_window_blocks_followup_hits() {
        let mut health = Health::new(100.0);
        let mut timers = HitTimers::default();
        let reaction = HitReaction::default();

        assert_eq!(
            deal_damage(&mut health, &mut timers, &reaction, 10.0),
            DamageResult::Damaged
        );
        assert_eq!(health.current, 90.0);
        assert_eq!(timers.invincible, reaction.invincibility);

        assert_eq!(
            deal_damage(&mut health, &mut timers, &reaction, 10.0),
            DamageResult::Ignored
        );
        assert_eq!(health.current, 90.0);

        // Window expires, damage lands again
        timers.tick(reaction.invincibility);
        assert_eq!(
            deal_damage(&mut health, &mut timers, &reaction, 10.0),
            DamageResult::Damaged
        );
        assert_eq!(health.current, 80.0);
    }

    #[test]
    fn heal_clamps_to_max_and_skips_dead() {
        let mut health = Health::new(50.0);
        health.current = 45.0;
        assert_eq!(heal(&mut health, 20.0), 5.0);
        assert_eq!(health.current, 50.0);

        health.current = 0.0;
        assert_eq!(heal(&mut health, 20.0), 0.0);
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn hit_timers_never_go_negative() {
        let mut timers = HitTimers {
            invincible: 0.1,
            knockback: 0.05,
            flash: 0.0,
        };
        timers.tick(1.0);
        assert_eq!(timers.invincible, 0.0);
        assert_eq!(timers.knockback, 0.0);
        assert_eq!(timers.flash, 0.0);
    }
}
