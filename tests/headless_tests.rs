//! Integration tests for headless battle execution
//!
//! These tests verify that:
//! - Headless battles run to completion
//! - Battle results are accessible programmatically
//! - Seeded RNG produces deterministic results

use std::time::Duration;

use bevy::prelude::*;

use hordesim::battle::systems::PlayerProgress;
use hordesim::combat::log::{BattleLog, BattleLogEventType};
use hordesim::headless::{build_battle_app, BattleResult, HeadlessBattleConfig, HeadlessBattleState};

const FRAME: Duration = Duration::from_micros(16_667);

fn create_config(max_duration_secs: f32, seed: Option<u64>) -> HeadlessBattleConfig {
    HeadlessBattleConfig {
        character: "Knight".to_string(),
        skills: vec![],
        max_duration_secs,
        random_seed: seed,
        output_path: Some("/dev/null".to_string()),
        catalog_path: None,
    }
}

/// Step the app at 60 fps until the battle completes or the frame budget
/// runs out
fn run_to_completion(app: &mut App, max_frames: usize) {
    for _ in 0..max_frames {
        app.world_mut().resource_mut::<Time>().advance_by(FRAME);
        app.update();
        if app
            .world()
            .resource::<HeadlessBattleState>()
            .battle_complete
        {
            return;
        }
    }
}

#[test]
fn battle_completes_at_the_time_limit() {
    let config = create_config(5.0, Some(42));
    let mut app = build_battle_app(config).unwrap();
    run_to_completion(&mut app, 60 * 7);

    let state = app.world().resource::<HeadlessBattleState>();
    assert!(state.battle_complete);
    let result = state.result.as_ref().expect("result populated");
    assert!(result.battle_time >= 5.0);
    assert_eq!(result.random_seed, Some(42));
    // One gold per full second survived
    assert_eq!(result.gold_earned, result.battle_time.floor() as i64);
}

#[test]
fn enemies_spawn_and_get_killed() {
    let config = create_config(30.0, Some(7));
    let mut app = build_battle_app(config).unwrap();
    run_to_completion(&mut app, 60 * 32);

    let progress = app.world().resource::<PlayerProgress>();
    assert!(
        progress.kills > 0,
        "Knight with Fire Bolt should kill something in 30s"
    );

    let log = app.world().resource::<BattleLog>();
    assert!(!log.filter_by_type(BattleLogEventType::Damage).is_empty());
    assert!(!log.filter_by_type(BattleLogEventType::Death).is_empty());

    let ended = regex::Regex::new(r"Battle ended after \d+\.\ds at level \d+ \(\d+ kills\)").unwrap();
    assert!(log.entries.iter().any(|e| ended.is_match(&e.message)));
}

#[test]
fn first_wave_starts_immediately() {
    let config = create_config(10.0, Some(1));
    let mut app = build_battle_app(config).unwrap();
    app.world_mut().resource_mut::<Time>().advance_by(FRAME);
    app.update();

    let log = app.world().resource::<BattleLog>();
    let waves = log.filter_by_type(BattleLogEventType::WaveChange);
    assert_eq!(waves.len(), 1);
    assert!(waves[0].message.contains("Wave 1"));
}

#[test]
fn seeded_battles_are_deterministic() {
    let run = |seed: u64| -> (u32, u32, f32) {
        let config = create_config(15.0, Some(seed));
        let mut app = build_battle_app(config).unwrap();
        run_to_completion(&mut app, 60 * 17);
        let progress = app.world().resource::<PlayerProgress>();
        let state = app.world().resource::<HeadlessBattleState>();
        let result = state.result.as_ref().unwrap();
        (progress.kills, progress.level, result.battle_time)
    };

    let first = run(12345);
    let second = run(12345);
    assert_eq!(first, second);

    // A different seed should diverge somewhere
    let third = run(54321);
    assert!(first != third || first.0 == 0);
}

#[test]
fn test_config_with_seed() {
    let config = create_config(60.0, Some(42));
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.character, "Knight");
}

#[test]
fn test_config_without_seed() {
    let config = create_config(60.0, None);
    assert!(config.random_seed.is_none());
}

#[test]
fn test_battle_result_fields() {
    let result = BattleResult {
        survived: true,
        battle_time: 300.0,
        final_level: 12,
        kills: 240,
        gold_earned: 300,
        random_seed: Some(12345),
    };

    assert!(result.survived);
    assert_eq!(result.final_level, 12);
    assert_eq!(result.random_seed, Some(12345));
}

#[test]
fn invalid_configs_are_rejected() {
    let config = HeadlessBattleConfig {
        character: "Nobody".to_string(),
        ..Default::default()
    };
    assert!(build_battle_app(config).is_err());

    let config = HeadlessBattleConfig {
        max_duration_secs: -1.0,
        ..Default::default()
    };
    assert!(build_battle_app(config).is_err());
}
