//! Headless battle execution
//!
//! Runs battles without any graphical output, suitable for automated testing.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::time::Duration;

use smallvec::SmallVec;

use crate::battle::boss::{boss_hit_reaction, BossBrain, BossProjectile, BOSS_PROJECTILE_POOL};
use crate::battle::data::{GameData, PassiveStat};
use crate::battle::effects::HitEffect;
use crate::battle::enemy::Enemy;
use crate::battle::health::{Health, HitReaction, HitTimers};
use crate::battle::pickups::{ExpGem, GEM_POOL};
use crate::battle::player::{player_hit_reaction, GlobalStats, Player, PlayerInput, PlayerProgress};
use crate::battle::progress::{battle_reward, PlayerBank};
use crate::battle::skills::area::{AreaZone, AREA_ZONE_POOL};
use crate::battle::skills::projectile::{Motion, SkillProjectile, SKILL_PROJECTILE_POOL};
use crate::battle::skills::{recompute_global_stats, BaseStats, SkillBook, SkillChange};
use crate::battle::systems::{
    self, ActiveEnemies, BattleClock, BattlePhase, BattleSystemPhase, BossSchedule, EntityPools,
    GameRng, PlayerTracker, Pooled, Velocity, WaveState,
};
use crate::combat::events::{SkillAddedEvent, SkillLeveledEvent};
use crate::combat::log::{BattleLog, BattleLogEventType, BattleSummary};

use super::config::HeadlessBattleConfig;

/// Result of a completed headless battle
///
/// This struct provides programmatic access to battle results for testing
/// and analysis.
#[derive(Debug, Clone)]
pub struct BattleResult {
    /// Whether the player was still alive when the battle ended
    pub survived: bool,
    /// Battle duration in seconds
    pub battle_time: f32,
    /// Final player level
    pub final_level: u32,
    /// Total enemies killed
    pub kills: u32,
    /// Gold awarded for the battle
    pub gold_earned: i64,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// Resource to track headless battle state
#[derive(Resource)]
pub struct HeadlessBattleState {
    /// Maximum battle duration before stopping
    pub max_duration: f32,
    /// Character played, for the summary
    pub character: String,
    /// Custom output path for the battle log
    pub output_path: Option<String>,
    /// Whether the battle has completed
    pub battle_complete: bool,
    /// Random seed for deterministic simulation (if provided)
    pub random_seed: Option<u64>,
    /// Battle result (populated when the battle completes)
    pub result: Option<BattleResult>,
}

/// Steers the player during automated battles: wander in a random
/// direction for a few seconds, then pick a new one
#[derive(Resource)]
struct WanderState {
    timer: f32,
}

const ENEMY_PREWARM: usize = 20;
const BOSS_PREWARM: usize = 1;
const BOSS_PROJECTILE_PREWARM: usize = 10;
const SKILL_PROJECTILE_PREWARM: usize = 20;
const AREA_ZONE_PREWARM: usize = 5;
const HIT_EFFECT_PREWARM: usize = 10;
const GEM_PREWARM: usize = 50;

/// Stock every pool with idle entities so the opening waves reuse instead
/// of allocating
fn prewarm_pools(commands: &mut Commands, pools: &mut EntityPools, data: &GameData) {
    for stats in &data.enemies {
        pools.create_pool(&stats.name);
        for _ in 0..ENEMY_PREWARM {
            let entity = commands
                .spawn((
                    Enemy::new(stats.clone()),
                    Health::new(stats.max_health),
                    HitTimers::default(),
                    HitReaction::default(),
                    Velocity::default(),
                    Transform::default(),
                    Pooled::idle(&stats.name),
                ))
                .id();
            pools.checkin(&stats.name, entity);
        }
    }

    for def in &data.bosses {
        pools.create_pool(&def.stats.name);
        for _ in 0..BOSS_PREWARM {
            let entity = commands
                .spawn((
                    Enemy::new(def.stats.clone()),
                    BossBrain::new(def.clone()),
                    Health::new(def.stats.max_health),
                    HitTimers::default(),
                    boss_hit_reaction(),
                    Velocity::default(),
                    Transform::default(),
                    Pooled::idle(&def.stats.name),
                ))
                .id();
            pools.checkin(&def.stats.name, entity);
        }
    }

    pools.create_pool(BOSS_PROJECTILE_POOL);
    for _ in 0..BOSS_PROJECTILE_PREWARM {
        let entity = commands
            .spawn((
                BossProjectile {
                    damage: 0.0,
                    lifetime: 0.0,
                },
                Velocity::default(),
                Transform::default(),
                Pooled::idle(BOSS_PROJECTILE_POOL),
            ))
            .id();
        pools.checkin(BOSS_PROJECTILE_POOL, entity);
    }

    pools.create_pool(SKILL_PROJECTILE_POOL);
    for _ in 0..SKILL_PROJECTILE_PREWARM {
        let entity = commands
            .spawn((
                SkillProjectile {
                    damage: 0.0,
                    pierce_left: 0,
                    motion: Motion::Straight(Vec2::ZERO),
                    lifetime: 0.0,
                    hit_effect: None,
                    recent_hits: SmallVec::new(),
                },
                Transform::default(),
                Pooled::idle(SKILL_PROJECTILE_POOL),
            ))
            .id();
        pools.checkin(SKILL_PROJECTILE_POOL, entity);
    }

    pools.create_pool(AREA_ZONE_POOL);
    for _ in 0..AREA_ZONE_PREWARM {
        let entity = commands
            .spawn((
                AreaZone {
                    damage: 0.0,
                    radius: 0.0,
                    remaining: 0.0,
                    tick_timer: 0.0,
                    hit_effect: None,
                },
                Transform::default(),
                Pooled::idle(AREA_ZONE_POOL),
            ))
            .id();
        pools.checkin(AREA_ZONE_POOL, entity);
    }

    pools.create_pool(GEM_POOL);
    for _ in 0..GEM_PREWARM {
        let entity = commands
            .spawn((
                ExpGem {
                    value: 0.0,
                    pulled: false,
                },
                Velocity::default(),
                Transform::default(),
                Pooled::idle(GEM_POOL),
            ))
            .id();
        pools.checkin(GEM_POOL, entity);
    }

    for skill in &data.skills {
        let Some(key) = &skill.hit_effect else { continue };
        // create_pool rejects duplicates; skills may share an effect
        if !pools.create_pool(key) {
            continue;
        }
        for _ in 0..HIT_EFFECT_PREWARM {
            let entity = commands
                .spawn((
                    HitEffect { remaining: 0.0 },
                    Transform::default(),
                    Pooled::idle(key),
                ))
                .id();
            pools.checkin(key, entity);
        }
    }
}

/// Plugin for headless battle execution
pub struct HeadlessPlugin {
    pub config: HeadlessBattleConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let data = self
            .config
            .load_catalog()
            .expect("Invalid battle catalog");
        self.config
            .validate_against(&data)
            .expect("Invalid battle configuration");

        app.insert_resource(data)
            .insert_resource(HeadlessBattleState {
                max_duration: self.config.max_duration_secs,
                character: self.config.character.clone(),
                output_path: self.config.output_path.clone(),
                battle_complete: false,
                random_seed: self.config.random_seed,
                result: None,
            })
            .insert_resource(self.config.clone())
            .init_resource::<BattleLog>()
            .init_resource::<BattlePhase>()
            .init_resource::<BattleClock>()
            .init_resource::<PlayerTracker>()
            .init_resource::<PlayerInput>()
            .init_resource::<PlayerProgress>()
            .init_resource::<SkillBook>()
            .init_resource::<EntityPools>()
            .init_resource::<ActiveEnemies>()
            .init_resource::<WaveState>()
            .init_resource::<PlayerBank>()
            .insert_resource(WanderState { timer: 0.0 });

        systems::register_battle_events(app);
        systems::configure_battle_system_ordering(app);
        systems::add_core_battle_systems(app, systems::battle_is_playing);

        app.add_systems(Startup, headless_setup_battle).add_systems(
            Update,
            (headless_wander, headless_check_battle_end)
                .chain()
                .after(BattleSystemPhase::Resolution),
        )
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Setup system for a headless battle
fn headless_setup_battle(
    mut commands: Commands,
    config: Res<HeadlessBattleConfig>,
    data: Res<GameData>,
    headless_state: Res<HeadlessBattleState>,
    bank: Res<PlayerBank>,
    mut phase: ResMut<BattlePhase>,
    mut pools: ResMut<EntityPools>,
    mut book: ResMut<SkillBook>,
    mut log: ResMut<BattleLog>,
    mut added_events: EventWriter<SkillAddedEvent>,
    mut leveled_events: EventWriter<SkillLeveledEvent>,
) {
    log.clear();
    log.log(
        BattleLogEventType::BattleEvent,
        "Battle started (headless mode)!".to_string(),
    );

    // Initialize GameRng with seed if provided (deterministic mode)
    let game_rng = match headless_state.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            GameRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            GameRng::from_entropy()
        }
    };
    commands.insert_resource(game_rng);

    prewarm_pools(&mut commands, &mut pools, &data);

    // Validated at plugin build time
    let character = data
        .character(&config.character)
        .expect("character validated at startup");

    // Grant starting skills plus any extras from the config
    for name in character.starting_skills.iter().chain(config.skills.iter()) {
        let Some(def) = data.skill(name) else { continue };
        match book.add_or_level(def) {
            SkillChange::Added(slot) => {
                added_events.send(SkillAddedEvent {
                    slot,
                    name: def.name.clone(),
                });
                log.log(
                    BattleLogEventType::SkillChange,
                    format!("Starting skill: {}", def.name),
                );
            }
            SkillChange::Leveled(slot, level) => {
                leveled_events.send(SkillLeveledEvent { slot, level });
            }
            _ => {}
        }
    }

    // Permanent upgrades bought between battles apply under everything else
    let mut base = GlobalStats::from_character(character);
    base.damage_mult *= 1.0 + bank.upgrade_bonus(PassiveStat::Damage);
    base.cooldown_mult =
        (base.cooldown_mult * (1.0 - bank.upgrade_bonus(PassiveStat::Cooldown))).max(0.1);
    base.area_mult *= 1.0 + bank.upgrade_bonus(PassiveStat::Area);
    base.move_speed_mult *= 1.0 + bank.upgrade_bonus(PassiveStat::MoveSpeed);
    base.bonus_max_health += character.max_health * bank.upgrade_bonus(PassiveStat::MaxHealth);

    let stats = recompute_global_stats(&base, &book);
    let max_health = character.max_health + stats.bonus_max_health;
    commands.insert_resource(BaseStats(base));
    commands.insert_resource(stats);
    commands.insert_resource(BossSchedule::default());

    commands.spawn((
        Player {
            move_speed: character.move_speed,
        },
        Health::new(max_health),
        HitTimers::default(),
        player_hit_reaction(),
        Velocity::default(),
        Transform::default(),
    ));

    phase.start();
    info!(
        "Headless battle setup complete: {} with {} skill(s)",
        character.name,
        book.slots.len()
    );
}

/// Pick a fresh wander direction every few seconds
fn headless_wander(
    time: Res<Time>,
    mut wander: ResMut<WanderState>,
    mut rng: ResMut<GameRng>,
    mut input: ResMut<PlayerInput>,
) {
    wander.timer -= time.delta_secs();
    if wander.timer > 0.0 {
        return;
    }
    wander.timer = rng.random_range(2.0, 4.0);
    let angle = rng.random_range(0.0, std::f32::consts::TAU);
    input.direction = Vec2::from_angle(angle);
}

/// Check if the battle has ended (player death or timeout)
fn headless_check_battle_end(
    clock: Res<BattleClock>,
    progress: Res<PlayerProgress>,
    mut phase: ResMut<BattlePhase>,
    mut bank: ResMut<PlayerBank>,
    mut log: ResMut<BattleLog>,
    mut headless_state: ResMut<HeadlessBattleState>,
    player: Query<&Health, With<Player>>,
) {
    if headless_state.battle_complete {
        return;
    }

    let survived = player
        .get_single()
        .map(|h| h.is_alive())
        .unwrap_or(false);

    let game_over = phase.phase == crate::battle::flow::GamePhase::GameOver;
    let timed_out = clock.elapsed >= headless_state.max_duration;
    if !game_over && !timed_out {
        return;
    }
    if timed_out && !game_over {
        phase.end();
        info!("Battle reached the {:.0}s limit", headless_state.max_duration);
    }

    let gold_earned = battle_reward(clock.elapsed);
    bank.add_gold(gold_earned);
    log.log(
        BattleLogEventType::BattleEvent,
        format!(
            "Battle ended after {:.1}s at level {} ({} kills)",
            clock.elapsed, progress.level, progress.kills
        ),
    );

    let result = BattleResult {
        survived,
        battle_time: clock.elapsed,
        final_level: progress.level,
        kills: progress.kills,
        gold_earned,
        random_seed: headless_state.random_seed,
    };

    let summary = BattleSummary {
        character_name: headless_state.character.clone(),
        survived,
        battle_time: clock.elapsed,
        final_level: progress.level,
        kills: progress.kills,
        random_seed: headless_state.random_seed,
    };
    match log.save_to_file(&summary, headless_state.output_path.as_deref()) {
        Ok(filename) => {
            println!("Battle complete. Log saved to: {}", filename);
        }
        Err(e) => {
            eprintln!("Failed to save battle log: {}", e);
        }
    }

    headless_state.result = Some(result);
    headless_state.battle_complete = true;
}

/// Exit the app when the battle is complete
fn headless_exit_on_complete(
    headless_state: Res<HeadlessBattleState>,
    mut exit: EventWriter<AppExit>,
) {
    if headless_state.battle_complete {
        exit.send(AppExit::Success);
    }
}

/// Build a battle app without the schedule runner.
///
/// Tests drive this app by advancing `Time` manually and calling
/// `app.update()`, which keeps simulated battles off the wall clock.
pub fn build_battle_app(config: HeadlessBattleConfig) -> Result<App, String> {
    let data = config.load_catalog()?;
    config.validate_against(&data)?;

    let mut app = App::new();
    app.init_resource::<Time>();
    app.add_plugins(TransformPlugin);
    app.add_plugins(HeadlessPlugin { config });
    Ok(app)
}

/// Run a headless battle with the given configuration
pub fn run_headless_battle(config: HeadlessBattleConfig) -> Result<(), String> {
    let data = config.load_catalog()?;
    config.validate_against(&data)?;

    println!("Starting headless battle simulation...");
    println!("  Character: {}", config.character);
    if !config.skills.is_empty() {
        println!("  Extra skills: {:?}", config.skills);
    }
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    App::new()
        // Minimal plugins - no window, no rendering
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        // Transform plugin needed for entity positions
        .add_plugins(TransformPlugin)
        // Our headless battle plugin
        .add_plugins(HeadlessPlugin { config })
        .run();

    Ok(())
}
