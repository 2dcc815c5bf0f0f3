//! Battle Systems API
//!
//! This module provides a stable API for the battle simulation systems.
//! Both graphical and headless modes should import from here rather than
//! directly from internal modules, allowing internal refactoring without
//! breaking external consumers.
//!
//! ## System Phases
//!
//! Battle systems run in three ordered phases each frame:
//!
//! 1. **Upkeep** - Clock, hit timers, player snapshot, wave schedule
//! 2. **CombatAndMovement** - Spawning, AI, skills, movement
//! 3. **Resolution** - Damage application, deaths, experience, level-ups
//!
//! ## Usage
//!
//! ```ignore
//! use hordesim::battle::systems;
//!
//! systems::configure_battle_system_ordering(&mut app);
//! systems::add_core_battle_systems(&mut app, || true);
//! ```

use bevy::prelude::*;

// === Phase 1: Upkeep ===
pub use super::flow::tick_battle_clock;
pub use super::health::tick_hit_timers;
pub use super::player::update_player_tracker;
pub use super::waves::advance_wave;

// === Phase 2: Combat and Movement ===
pub use super::boss::{handle_volley_requests, run_boss_brains, spawn_scheduled_bosses};
pub use super::components::integrate_velocity;
pub use super::enemy::enemy_chase;
pub use super::pickups::magnet_gems;
pub use super::player::move_player;
pub use super::skills::area::{place_area_zones, tick_area_zones};
pub use super::skills::aura::{sync_aura_bodies, tick_auras};
pub use super::skills::orbit::{sync_orbit_bodies, tick_orbits};
pub use super::skills::projectile::{fire_projectiles, move_skill_projectiles};
pub use super::skills::tick_active_skills;
pub use super::spawner::{handle_summon_requests, relocate_distant_enemies, spawn_wave_enemies};

// === Phase 3: Resolution ===
pub use super::boss::boss_projectile_hits;
pub use super::effects::{spawn_hit_effects, tick_hit_effects};
pub use super::enemy::{apply_enemy_damage, enemy_contact_damage, finish_enemy_deaths};
pub use super::pickups::spawn_gems_on_death;
pub use super::player::{apply_experience, check_player_death};
pub use super::skills::auto_pick_skills_on_level;
pub use super::skills::projectile::skill_projectile_hits;

// === Components and Resources ===
pub use super::components::{GameRng, PlayerTracker, Velocity};
pub use super::flow::{battle_is_playing, BattleClock, BattlePhase, BossSchedule};
pub use super::player::{GlobalStats, Player, PlayerInput, PlayerProgress};
pub use super::pool::{EntityPools, Pooled};
pub use super::skills::{BaseStats, SkillBook};
pub use super::spawner::ActiveEnemies;
pub use super::waves::WaveState;

/// Registers every battle event type on the app.
///
/// Call this once during app setup before adding battle systems.
pub fn register_battle_events(app: &mut App) {
    app.add_event::<crate::combat::events::PlayerHealthChangedEvent>()
        .add_event::<crate::combat::events::PlayerDiedEvent>()
        .add_event::<crate::combat::events::PlayerLeveledEvent>()
        .add_event::<crate::combat::events::ExperienceGainedEvent>()
        .add_event::<crate::combat::events::ExperienceChangedEvent>()
        .add_event::<crate::combat::events::GlobalStatsChangedEvent>()
        .add_event::<crate::combat::events::EnemyDamageEvent>()
        .add_event::<crate::combat::events::EnemyDiedEvent>()
        .add_event::<crate::combat::events::WaveChangedEvent>()
        .add_event::<crate::combat::events::BossSpawnedEvent>()
        .add_event::<crate::combat::events::SkillAddedEvent>()
        .add_event::<crate::combat::events::SkillLeveledEvent>()
        .add_event::<crate::combat::events::SkillActivationEvent>()
        .add_event::<crate::combat::events::HitEffectRequestEvent>()
        .add_event::<crate::combat::events::SummonRequestEvent>()
        .add_event::<crate::combat::events::VolleyRequestEvent>();
}

/// System set labels for battle system ordering.
///
/// Use these to ensure proper ordering when adding custom systems that
/// interact with the battle.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BattleSystemPhase {
    /// Phase 1: Clock, timers, player snapshot, wave schedule
    Upkeep,
    /// Phase 2: Spawning, AI, skills, movement
    CombatAndMovement,
    /// Phase 3: Damage, deaths, experience, level-ups
    Resolution,
}

/// Configures the ordering between battle system phases.
///
/// Call this once during app setup before adding battle systems.
pub fn configure_battle_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            BattleSystemPhase::Upkeep,
            BattleSystemPhase::CombatAndMovement,
            BattleSystemPhase::Resolution,
        )
            .chain(),
    );
}

/// Adds core battle simulation systems to the app.
///
/// These are the systems needed for the battle loop to function. Both
/// graphical and headless modes need these.
///
/// # Arguments
/// * `app` - The Bevy App to add systems to
/// * `run_condition` - A run condition gating the whole loop
pub fn add_core_battle_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    // Phase 1: Upkeep
    app.add_systems(
        Update,
        (
            tick_battle_clock,
            tick_hit_timers,
            update_player_tracker,
            advance_wave,
        )
            .chain()
            .in_set(BattleSystemPhase::Upkeep)
            .run_if(run_condition.clone()),
    );

    // Flush deferred commands between phases
    app.add_systems(
        Update,
        apply_deferred
            .after(BattleSystemPhase::Upkeep)
            .before(BattleSystemPhase::CombatAndMovement)
            .run_if(run_condition.clone()),
    );

    // Phase 2: Combat and Movement
    app.add_systems(
        Update,
        (
            (
                move_player,
                spawn_wave_enemies,
                spawn_scheduled_bosses,
                run_boss_brains,
                handle_summon_requests,
                handle_volley_requests,
                enemy_chase,
            )
                .chain(),
            (
                tick_active_skills,
                fire_projectiles,
                place_area_zones,
                sync_aura_bodies,
                sync_orbit_bodies,
                integrate_velocity,
                move_skill_projectiles,
                tick_auras,
                tick_orbits,
                tick_area_zones,
                relocate_distant_enemies,
                magnet_gems,
            )
                .chain(),
        )
            .chain()
            .in_set(BattleSystemPhase::CombatAndMovement)
            .run_if(run_condition.clone()),
    );

    // Phase 3: Resolution
    app.add_systems(
        Update,
        (
            skill_projectile_hits,
            apply_enemy_damage,
            boss_projectile_hits,
            enemy_contact_damage,
            spawn_gems_on_death,
            spawn_hit_effects,
            tick_hit_effects,
            finish_enemy_deaths,
            apply_experience,
            auto_pick_skills_on_level,
            check_player_death,
        )
            .chain()
            .in_set(BattleSystemPhase::Resolution)
            .run_if(run_condition),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_phase_ordering() {
        // Verify system phases can be compared for ordering
        assert_ne!(
            BattleSystemPhase::Upkeep,
            BattleSystemPhase::CombatAndMovement
        );
        assert_ne!(
            BattleSystemPhase::CombatAndMovement,
            BattleSystemPhase::Resolution
        );
    }
}
