//! Targeted simulation tests
//!
//! Each test builds a battle app, swaps in a quiet catalog (no wave or
//! boss spawns), plants enemies by hand, and steps the clock to observe a
//! single mechanic in isolation.

use std::time::Duration;

use bevy::prelude::*;

use hordesim::battle::boss::{BossBrain, BossProjectile, BOSS_PROJECTILE_POOL};
use hordesim::battle::data::{BossEntry, GameData};
use hordesim::battle::effects::HitEffect;
use hordesim::battle::enemy::Enemy;
use hordesim::battle::health::{Health, HitReaction, HitTimers};
use hordesim::battle::skills::area::AreaZone;
use hordesim::battle::skills::aura::AuraBody;
use hordesim::battle::skills::orbit::OrbitBody;
use hordesim::battle::skills::SkillBook;
use hordesim::battle::systems::{ActiveEnemies, PlayerProgress, Pooled, Velocity};
use hordesim::combat::events::SkillLeveledEvent;
use hordesim::headless::{build_battle_app, HeadlessBattleConfig};

const FRAME: Duration = Duration::from_micros(16_667);

fn quiet_config(skills: Vec<&str>, seed: u64) -> HeadlessBattleConfig {
    HeadlessBattleConfig {
        character: "Knight".to_string(),
        skills: skills.into_iter().map(String::from).collect(),
        max_duration_secs: 300.0,
        random_seed: Some(seed),
        output_path: Some("/dev/null".to_string()),
        catalog_path: None,
    }
}

/// Build an app whose catalog never spawns waves or bosses, with a
/// stationary player
fn quiet_app(config: HeadlessBattleConfig) -> App {
    let mut app = build_battle_app(config).unwrap();

    let mut data = GameData::builtin();
    for wave in &mut data.waves {
        wave.start_time = 1.0e9;
    }
    data.boss_entries.clear();
    for character in &mut data.characters {
        character.move_speed = 0.0;
    }
    app.insert_resource(data);
    app
}

fn step(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.world_mut().resource_mut::<Time>().advance_by(FRAME);
        app.update();
    }
}

/// Plant an enemy directly into the world
fn plant_enemy(app: &mut App, position: Vec2, max_health: f32) -> Entity {
    let stats = {
        let data = app.world().resource::<GameData>();
        let mut stats = data.enemies[0].clone();
        stats.max_health = max_health;
        // Keep it rooted so the test controls the geometry
        stats.move_speed = 0.0;
        stats
    };
    let entity = app
        .world_mut()
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
    app.world_mut()
        .resource_mut::<ActiveEnemies>()
        .insert(entity);
    entity
}

#[test]
fn projectile_skill_kills_a_nearby_enemy() {
    let mut app = quiet_app(quiet_config(vec![], 3));
    // Let setup run before planting
    step(&mut app, 1);
    plant_enemy(&mut app, Vec2::new(3.0, 0.0), 10.0);

    // Fire Bolt: 10 damage on a 1.5s cooldown, well within scan range
    step(&mut app, 120);

    let progress = app.world().resource::<PlayerProgress>();
    assert_eq!(progress.kills, 1);
    // The gem drop got magnetized and collected (3 units is inside the
    // magnet radius), so experience arrived too
    assert!(progress.exp > 0.0);
}

#[test]
fn enemy_out_of_scan_range_is_not_targeted() {
    let mut app = quiet_app(quiet_config(vec![], 4));
    step(&mut app, 1);
    let far = plant_enemy(&mut app, Vec2::new(100.0, 0.0), 10.0);

    step(&mut app, 120);

    let health = app.world().entity(far).get::<Health>().unwrap();
    assert_eq!(health.current, 10.0);
    assert_eq!(app.world().resource::<PlayerProgress>().kills, 0);
}

#[test]
fn aura_burns_enemies_inside_the_field() {
    let mut app = quiet_app(quiet_config(vec!["Frost Aura"], 5));
    step(&mut app, 1);
    // Inside the level-1 aura radius of 2, outside projectile reach is
    // irrelevant since the Knight's Fire Bolt will also hit; park the
    // enemy with enough health to survive a few hits
    let enemy = plant_enemy(&mut app, Vec2::new(1.5, 0.0), 1000.0);

    let bodies = app
        .world_mut()
        .query::<&AuraBody>()
        .iter(app.world())
        .count();
    assert_eq!(bodies, 1, "aura body spawns with the starting skill");

    step(&mut app, 90);

    let health = app.world().entity(enemy).get::<Health>().unwrap();
    assert!(
        health.current < 1000.0,
        "aura ticks should have damaged the enemy"
    );

    // Aura hits flash the same pooled effect as any other damage source
    let world = app.world_mut();
    let sparks = world
        .query::<(&HitEffect, &Pooled)>()
        .iter(world)
        .filter(|(_, pooled)| pooled.active && pooled.key == "frost_nip")
        .count();
    assert!(sparks > 0, "aura ticks spawn their hit effect");
}

#[test]
fn area_zone_drops_at_the_player_without_targets() {
    let mut app = quiet_app(quiet_config(vec!["Scorch Zone"], 11));
    // No enemies anywhere; the zone still goes down, at the player's feet
    step(&mut app, 5);

    let world = app.world_mut();
    let zones: Vec<Vec2> = world
        .query::<(&AreaZone, &Pooled, &Transform)>()
        .iter(world)
        .filter(|(_, pooled, _)| pooled.active)
        .map(|(_, _, transform)| transform.translation.truncate())
        .collect();
    assert_eq!(zones.len(), 1);
    assert!(zones[0].length() < 1e-3, "zone centers on the stationary player");
}

#[test]
fn area_zone_ticks_push_enemies_outward() {
    let mut app = quiet_app(quiet_config(vec!["Scorch Zone"], 12));
    step(&mut app, 1);
    // Rooted tank just off the zone's center
    let enemy = plant_enemy(&mut app, Vec2::new(0.5, 0.0), 100000.0);

    // Watch for the knockback impulse on a damage tick
    let mut max_vx = f32::MIN;
    for _ in 0..60 {
        step(&mut app, 1);
        let vx = app.world().entity(enemy).get::<Velocity>().unwrap().0.x;
        max_vx = max_vx.max(vx);
    }
    assert!(max_vx > 0.0, "zone hits should push the enemy away from the center");
}

#[test]
fn scheduled_bosses_spawn_exactly_once() {
    let mut app = quiet_app(quiet_config(vec![], 13));
    app.world_mut().resource_mut::<GameData>().boss_entries = vec![BossEntry {
        spawn_time: 0.5,
        boss: "Stone Golem".to_string(),
    }];

    let active_bosses = |app: &mut App| {
        let world = app.world_mut();
        world
            .query::<(&BossBrain, &Pooled)>()
            .iter(world)
            .filter(|(_, pooled)| pooled.active)
            .count()
    };

    step(&mut app, 60); // one second in
    assert_eq!(active_bosses(&mut app), 1);

    // A consumed entry never fires again
    step(&mut app, 120);
    assert_eq!(active_bosses(&mut app), 1);
}

#[test]
fn waves_spawn_their_full_batch_per_tick() {
    let mut app = quiet_app(quiet_config(vec![], 14));
    {
        let mut data = app.world_mut().resource_mut::<GameData>();
        data.waves.truncate(1);
        data.waves[0].start_time = 0.0;
        data.waves[0].spawn_interval = 1000.0;
        data.waves[0].spawn_count = 5;
    }

    step(&mut app, 2);
    assert_eq!(app.world().resource::<ActiveEnemies>().len(), 5);
}

#[test]
fn boss_projectiles_expire_by_lifetime() {
    let mut app = quiet_app(quiet_config(vec![], 15));
    step(&mut app, 1);

    // Parked well away from the player so nothing collides
    let projectile = app
        .world_mut()
        .spawn((
            BossProjectile {
                damage: 5.0,
                lifetime: 0.05,
            },
            Velocity::default(),
            Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            Pooled::new(BOSS_PROJECTILE_POOL),
        ))
        .id();

    step(&mut app, 12); // 0.2s, past the lifetime
    let pooled = app.world().entity(projectile).get::<Pooled>().unwrap();
    assert!(!pooled.active, "expired projectile returns to its pool");
}

#[test]
fn orbit_ring_has_evenly_spaced_bodies() {
    let mut app = quiet_app(quiet_config(vec!["Orbiting Blades"], 6));
    step(&mut app, 2);

    let world = app.world_mut();
    let bodies: Vec<(u32, f32)> = world
        .query::<&OrbitBody>()
        .iter(world)
        .map(|b| (b.index, b.angle))
        .collect();
    // Level 1 Orbiting Blades runs two bodies
    assert_eq!(bodies.len(), 2);
    let diff = (bodies[0].1 - bodies[1].1).rem_euclid(360.0);
    assert!((diff - 180.0).abs() < 5.0, "bodies half a turn apart, got {}", diff);
}

#[test]
fn orbit_damages_enemies_it_passes_through() {
    let mut app = quiet_app(quiet_config(vec!["Orbiting Blades"], 8));
    step(&mut app, 1);
    // On the orbit radius of 2; the ring sweeps through it twice a turn
    let enemy = plant_enemy(&mut app, Vec2::new(2.0, 0.0), 1000.0);

    step(&mut app, 120);

    let health = app.world().entity(enemy).get::<Health>().unwrap();
    assert!(health.current < 1000.0);
}

#[test]
fn orbit_level_up_keeps_the_existing_bodies() {
    let mut app = quiet_app(quiet_config(vec!["Orbiting Blades"], 16));
    step(&mut app, 2);

    let before: Vec<Entity> = {
        let world = app.world_mut();
        world
            .query_filtered::<Entity, With<OrbitBody>>()
            .iter(world)
            .collect()
    };
    assert_eq!(before.len(), 2);

    // Level 2 grows the ring to three bodies
    {
        let world = app.world_mut();
        let slot = world
            .resource::<SkillBook>()
            .find("Orbiting Blades")
            .unwrap();
        world.resource_mut::<SkillBook>().slots[slot].level = 2;
        world.send_event(SkillLeveledEvent { slot, level: 2 });
    }
    step(&mut app, 1);

    let world = app.world_mut();
    let after: Vec<Entity> = world
        .query_filtered::<Entity, With<OrbitBody>>()
        .iter(world)
        .collect();
    assert_eq!(after.len(), 3);
    for entity in &before {
        assert!(after.contains(entity), "growing the ring keeps the old orbs");
    }
}

#[test]
fn dead_enemies_linger_then_leave_the_active_set() {
    let mut app = quiet_app(quiet_config(vec![], 9));
    step(&mut app, 1);
    let enemy = plant_enemy(&mut app, Vec2::new(2.0, 0.0), 1.0);

    // One Fire Bolt hit kills it; the death linger holds it in the world
    // for half a second before it leaves the active set
    step(&mut app, 30);
    assert_eq!(app.world().resource::<PlayerProgress>().kills, 1);

    step(&mut app, 60);
    assert!(!app.world().resource::<ActiveEnemies>().contains(enemy));
}

#[test]
fn contact_damage_hurts_the_player_once_per_window() {
    let mut app = quiet_app(quiet_config(vec![], 10));
    step(&mut app, 1);
    // Tanky enemy parked on top of the player
    plant_enemy(&mut app, Vec2::new(0.2, 0.0), 100000.0);

    let hp_before = {
        let world = app.world_mut();
        let mut query = world.query_filtered::<&Health, With<hordesim::battle::systems::Player>>();
        query.single(world).current
    };

    // Half a second covers one 0.5s invincibility window
    step(&mut app, 30);

    let hp_after = {
        let world = app.world_mut();
        let mut query = world.query_filtered::<&Health, With<hordesim::battle::systems::Player>>();
        query.single(world).current
    };
    let lost = hp_before - hp_after;
    // Slime contact damage is 5; at most two windows fit in 0.5s
    assert!(lost >= 5.0, "player should take contact damage");
    assert!(lost <= 10.0, "invincibility must gate the crowd, lost {}", lost);
}
