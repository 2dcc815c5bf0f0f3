//! Boss behavior
//!
//! A boss is an enemy with a pattern brain bolted on. The brain is a small
//! state machine advanced by a pure step function so pattern selection,
//! windups, and cooldown timing are testable without a world.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::events::{
    BossSpawnedEvent, PlayerHealthChangedEvent, SummonRequestEvent, VolleyRequestEvent,
};
use crate::combat::log::{BattleLog, BattleLogEventType};

use super::components::{GameRng, PlayerTracker, Velocity};
use super::data::{BossDef, BossPatternKind, GameData};
use super::enemy::Enemy;
use super::flow::{BattleClock, BossSchedule};
use super::health::{deal_damage, Health, HitReaction, HitTimers};
use super::player::{player_hit_reaction, Player};
use super::pool::{release_entity, EntityPools, Pooled, ReleaseOutcome};
use super::spawner::{ActiveEnemies, SPAWN_RING_MAX, SPAWN_RING_MIN};

/// Brief execution phase for instantaneous patterns, so a boss cannot
/// select twice in the same frame
const EXECUTE_SECS: f32 = 0.1;
/// Pool key for boss projectiles
pub const BOSS_PROJECTILE_POOL: &str = "boss_projectile";
/// Seconds a boss projectile flies before returning to its pool
const BOSS_PROJECTILE_LIFETIME: f32 = 5.0;
const BOSS_PROJECTILE_RADIUS: f32 = 0.3;
const PLAYER_RADIUS: f32 = 0.5;

/// Current state of a boss's pattern machine
#[derive(Debug, Clone, Default)]
pub enum BossPhase {
    /// Chasing the player, free to select a pattern
    #[default]
    Idle,
    /// Telegraphing a pattern; stands still
    Windup { pattern: usize, remaining: f32 },
    /// Performing a pattern. `dir` is the charge direction, captured when
    /// the windup ends.
    Executing {
        pattern: usize,
        remaining: f32,
        dir: Vec2,
    },
    /// Catching its breath after a pattern; stands still
    Recovery { pattern: usize, remaining: f32 },
}

/// What a brain step wants done in the world
#[derive(Debug, Clone, PartialEq)]
pub enum BrainAction {
    SetVelocity(Vec2),
    Volley {
        directions: Vec<Vec2>,
        speed: f32,
        damage: f32,
    },
    Summon {
        enemy: String,
        count: u32,
        radius: f32,
    },
    Slam {
        radius: f32,
        damage: f32,
    },
}

/// Pattern state machine attached to a boss entity
#[derive(Component, Debug, Clone)]
pub struct BossBrain {
    pub def: BossDef,
    /// Remaining cooldown per pattern, parallel to `def.patterns`
    pub pattern_timers: Vec<f32>,
    pub phase: BossPhase,
}

impl BossBrain {
    /// First use of each pattern comes up at half its normal cooldown, so
    /// a fresh boss opens with an attack instead of a long chase.
    pub fn new(def: BossDef) -> Self {
        let pattern_timers = def.patterns.iter().map(|p| p.cooldown * 0.5).collect();
        Self {
            def,
            pattern_timers,
            phase: BossPhase::Idle,
        }
    }

    fn ready_pattern(&self) -> Option<usize> {
        self.pattern_timers.iter().position(|t| *t <= 0.0)
    }

    /// Advance the machine by one step.
    ///
    /// `to_player` is the vector from the boss to the player. At most one
    /// pattern is in flight at a time; a pattern's cooldown restarts the
    /// moment it is selected, not when it finishes.
    pub fn advance(&mut self, dt: f32, to_player: Vec2) -> SmallVec<[BrainAction; 2]> {
        let mut actions = SmallVec::new();
        // The in-flight pattern's own cooldown holds until it finishes
        let in_flight = match &self.phase {
            BossPhase::Idle => None,
            BossPhase::Windup { pattern, .. }
            | BossPhase::Executing { pattern, .. }
            | BossPhase::Recovery { pattern, .. } => Some(*pattern),
        };
        for (index, timer) in self.pattern_timers.iter_mut().enumerate() {
            if in_flight != Some(index) {
                *timer = (*timer - dt).max(0.0);
            }
        }

        let phase = std::mem::take(&mut self.phase);
        self.phase = match phase {
            BossPhase::Idle => match self.ready_pattern() {
                Some(index) => {
                    self.pattern_timers[index] = self.def.patterns[index].cooldown;
                    actions.push(BrainAction::SetVelocity(Vec2::ZERO));
                    match self.def.patterns[index].kind.clone() {
                        BossPatternKind::Charge { windup_secs, .. } => BossPhase::Windup {
                            pattern: index,
                            remaining: windup_secs,
                        },
                        BossPatternKind::Slam { windup_secs, .. } => BossPhase::Windup {
                            pattern: index,
                            remaining: windup_secs,
                        },
                        BossPatternKind::Volley {
                            count,
                            spread_degrees,
                            speed,
                            damage,
                        } => {
                            actions.push(BrainAction::Volley {
                                directions: centered_fan(
                                    to_player.normalize_or_zero(),
                                    count,
                                    spread_degrees,
                                ),
                                speed,
                                damage,
                            });
                            BossPhase::Executing {
                                pattern: index,
                                remaining: EXECUTE_SECS,
                                dir: Vec2::ZERO,
                            }
                        }
                        BossPatternKind::Summon {
                            enemy,
                            count,
                            radius,
                        } => {
                            actions.push(BrainAction::Summon {
                                enemy,
                                count,
                                radius,
                            });
                            BossPhase::Executing {
                                pattern: index,
                                remaining: EXECUTE_SECS,
                                dir: Vec2::ZERO,
                            }
                        }
                    }
                }
                None => {
                    actions.push(BrainAction::SetVelocity(
                        to_player.normalize_or_zero() * self.def.stats.move_speed,
                    ));
                    BossPhase::Idle
                }
            },
            BossPhase::Windup { pattern, remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    actions.push(BrainAction::SetVelocity(Vec2::ZERO));
                    BossPhase::Windup { pattern, remaining }
                } else {
                    match self.def.patterns[pattern].kind.clone() {
                        BossPatternKind::Charge {
                            speed,
                            duration_secs,
                            ..
                        } => {
                            // Charge direction locks in at the end of the
                            // telegraph; the dash does not track the player
                            let dir = to_player.normalize_or_zero();
                            actions.push(BrainAction::SetVelocity(dir * speed));
                            BossPhase::Executing {
                                pattern,
                                remaining: duration_secs,
                                dir,
                            }
                        }
                        BossPatternKind::Slam { radius, damage, .. } => {
                            actions.push(BrainAction::Slam { radius, damage });
                            BossPhase::Executing {
                                pattern,
                                remaining: EXECUTE_SECS,
                                dir: Vec2::ZERO,
                            }
                        }
                        _ => BossPhase::Idle,
                    }
                }
            }
            BossPhase::Executing {
                pattern,
                remaining,
                dir,
            } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    BossPhase::Executing {
                        pattern,
                        remaining,
                        dir,
                    }
                } else {
                    actions.push(BrainAction::SetVelocity(Vec2::ZERO));
                    BossPhase::Recovery {
                        pattern,
                        remaining: self.def.patterns[pattern].recovery_secs,
                    }
                }
            }
            BossPhase::Recovery { pattern, remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    BossPhase::Recovery { pattern, remaining }
                } else {
                    BossPhase::Idle
                }
            }
        };
        actions
    }
}

/// Fan of `count` directions centered on `dir`, `spread_deg` apart
pub fn centered_fan(dir: Vec2, count: u32, spread_deg: f32) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let start = -spread_deg * (count as f32 - 1.0) / 2.0;
    (0..count)
        .map(|i| {
            let angle = (start + spread_deg * i as f32).to_radians();
            Vec2::from_angle(angle).rotate(dir)
        })
        .collect()
}

type BossReuseQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Enemy,
        &'static mut BossBrain,
        &'static mut Health,
        &'static mut HitTimers,
        &'static mut Velocity,
        &'static mut Transform,
        &'static mut Pooled,
    ),
>;

/// Bosses flash but never get knocked around
pub fn boss_hit_reaction() -> HitReaction {
    HitReaction {
        knockback_force: 0.0,
        knockback_duration: 0.0,
        invincibility: 0.1,
        flash_duration: 0.1,
    }
}

/// Spawn bosses whose scheduled time has passed; each entry fires once
pub fn spawn_scheduled_bosses(
    clock: Res<BattleClock>,
    data: Res<GameData>,
    tracker: Res<PlayerTracker>,
    mut schedule: ResMut<BossSchedule>,
    mut rng: ResMut<GameRng>,
    mut pools: ResMut<EntityPools>,
    mut active: ResMut<ActiveEnemies>,
    mut commands: Commands,
    mut reusable: BossReuseQuery,
    mut spawned_events: EventWriter<BossSpawnedEvent>,
    mut log: ResMut<BattleLog>,
) {
    while schedule.next_index < data.boss_entries.len() {
        let entry = &data.boss_entries[schedule.next_index];
        if clock.elapsed < entry.spawn_time {
            break;
        }
        schedule.next_index += 1;
        let Some(def) = data.boss(&entry.boss) else {
            continue;
        };
        let def = def.clone();

        let radius = rng.random_range(SPAWN_RING_MIN, SPAWN_RING_MAX);
        let position = rng.random_on_circle(tracker.position, radius);

        if !pools.has_pool(&def.stats.name) {
            pools.create_pool(&def.stats.name);
        }

        let name = def.stats.name.clone();
        let stats = def.stats.clone();

        let mut reused = None;
        if let Some(entity) = pools.checkout(&name) {
            if let Ok((mut enemy, mut brain, mut health, mut timers, mut velocity, mut transform, mut pooled)) =
                reusable.get_mut(entity)
            {
                enemy.stats = stats.clone();
                enemy.dying = None;
                *brain = BossBrain::new(def.clone());
                *health = Health::new(stats.max_health);
                *timers = HitTimers::default();
                velocity.0 = Vec2::ZERO;
                transform.translation = position.extend(0.0);
                pooled.active = true;
                reused = Some(entity);
            }
        }
        let entity = reused.unwrap_or_else(|| {
            commands
                .spawn((
                    Enemy::new(stats.clone()),
                    BossBrain::new(def),
                    Health::new(stats.max_health),
                    HitTimers::default(),
                    boss_hit_reaction(),
                    Velocity::default(),
                    Transform::from_translation(position.extend(0.0)),
                    Pooled::new(&name),
                ))
                .id()
        });
        active.insert(entity);
        spawned_events.send(BossSpawnedEvent { name: name.clone() });
        log.log(BattleLogEventType::BossSpawn, format!("{} appeared", name));
    }
}

/// Step every boss brain and carry out its actions
pub fn run_boss_brains(
    time: Res<Time>,
    data: Res<GameData>,
    tracker: Res<PlayerTracker>,
    mut rng: ResMut<GameRng>,
    mut bosses: Query<(&Enemy, &Pooled, &Transform, &mut BossBrain, &mut Velocity)>,
    mut player: Query<(&mut Health, &mut HitTimers), With<Player>>,
    mut volley_events: EventWriter<VolleyRequestEvent>,
    mut summon_events: EventWriter<SummonRequestEvent>,
    mut health_events: EventWriter<PlayerHealthChangedEvent>,
    mut log: ResMut<BattleLog>,
) {
    let dt = time.delta_secs();
    for (enemy, pooled, transform, mut brain, mut velocity) in bosses.iter_mut() {
        if !pooled.active || enemy.is_dying() {
            continue;
        }
        let position = transform.translation.truncate();
        let to_player = tracker.position - position;

        for action in brain.advance(dt, to_player) {
            match action {
                BrainAction::SetVelocity(v) => velocity.0 = v,
                BrainAction::Volley {
                    directions,
                    speed,
                    damage,
                } => {
                    volley_events.send(VolleyRequestEvent {
                        origin: position,
                        directions,
                        speed,
                        damage,
                    });
                }
                BrainAction::Summon {
                    enemy: name,
                    count,
                    radius,
                } => {
                    if let Some(stats) = data.enemy(&name) {
                        // Minions scatter randomly around the boss
                        let positions = (0..count)
                            .map(|_| rng.random_in_circle(position, radius))
                            .collect();
                        summon_events.send(SummonRequestEvent {
                            stats: stats.clone(),
                            positions,
                        });
                    }
                }
                BrainAction::Slam { radius, damage } => {
                    if tracker.position.distance(position) <= radius {
                        if let Ok((mut health, mut timers)) = player.get_single_mut() {
                            let reaction = player_hit_reaction();
                            if deal_damage(&mut health, &mut timers, &reaction, damage)
                                != super::health::DamageResult::Ignored
                            {
                                health_events.send(PlayerHealthChangedEvent {
                                    current: health.current,
                                    max: health.max,
                                });
                                log.log(
                                    BattleLogEventType::Damage,
                                    format!("{} slam hit the player for {:.0}", enemy.stats.name, damage),
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Projectile fired by a boss volley
#[derive(Component, Debug, Clone, Copy)]
pub struct BossProjectile {
    pub damage: f32,
    /// Seconds of flight left before the projectile is reclaimed
    pub lifetime: f32,
}

type BossProjectileReuseQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut BossProjectile,
        &'static mut Velocity,
        &'static mut Transform,
        &'static mut Pooled,
    ),
>;

/// Materialize volley requests as pooled projectiles
pub fn handle_volley_requests(
    mut requests: EventReader<VolleyRequestEvent>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut reusable: BossProjectileReuseQuery,
) {
    for request in requests.read() {
        if !pools.has_pool(BOSS_PROJECTILE_POOL) {
            pools.create_pool(BOSS_PROJECTILE_POOL);
        }
        for dir in &request.directions {
            let velocity = *dir * request.speed;
            let mut reused = false;
            if let Some(entity) = pools.checkout(BOSS_PROJECTILE_POOL) {
                if let Ok((mut projectile, mut vel, mut transform, mut pooled)) =
                    reusable.get_mut(entity)
                {
                    projectile.damage = request.damage;
                    projectile.lifetime = BOSS_PROJECTILE_LIFETIME;
                    vel.0 = velocity;
                    transform.translation = request.origin.extend(0.0);
                    pooled.active = true;
                    reused = true;
                }
            }
            if !reused {
                commands.spawn((
                    BossProjectile {
                        damage: request.damage,
                        lifetime: BOSS_PROJECTILE_LIFETIME,
                    },
                    Velocity(velocity),
                    Transform::from_translation(request.origin.extend(0.0)),
                    Pooled::new(BOSS_PROJECTILE_POOL),
                ));
            }
        }
    }
}

/// Collide boss projectiles with the player and reclaim expired ones
pub fn boss_projectile_hits(
    time: Res<Time>,
    tracker: Res<PlayerTracker>,
    mut pools: ResMut<EntityPools>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut BossProjectile, &Transform, &mut Pooled)>,
    mut player: Query<(&mut Health, &mut HitTimers), With<Player>>,
    mut health_events: EventWriter<PlayerHealthChangedEvent>,
    mut log: ResMut<BattleLog>,
) {
    for (entity, mut projectile, transform, mut pooled) in projectiles.iter_mut() {
        if !pooled.active {
            continue;
        }
        projectile.lifetime -= time.delta_secs();
        let position = transform.translation.truncate();
        let dist = position.distance(tracker.position);

        let mut reclaim = projectile.lifetime <= 0.0;
        if !reclaim && tracker.alive && dist <= BOSS_PROJECTILE_RADIUS + PLAYER_RADIUS {
            if let Ok((mut health, mut timers)) = player.get_single_mut() {
                let reaction = player_hit_reaction();
                if deal_damage(&mut health, &mut timers, &reaction, projectile.damage)
                    != super::health::DamageResult::Ignored
                {
                    health_events.send(PlayerHealthChangedEvent {
                        current: health.current,
                        max: health.max,
                    });
                    log.log(
                        BattleLogEventType::Damage,
                        format!("Boss projectile hit the player for {:.0}", projectile.damage),
                    );
                }
            }
            reclaim = true;
        }

        if reclaim && release_entity(&mut pools, &mut pooled, entity) == ReleaseOutcome::Despawn {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::data::{AttackPattern, EnemyStats};

    fn test_boss(patterns: Vec<AttackPattern>) -> BossBrain {
        BossBrain::new(BossDef {
            stats: EnemyStats {
                name: "Test Boss".to_string(),
                max_health: 100.0,
                move_speed: 2.0,
                contact_damage: 10.0,
                exp_reward: 10.0,
                radius: 1.0,
            },
            patterns,
        })
    }

    fn volley_pattern(cooldown: f32) -> AttackPattern {
        AttackPattern {
            kind: BossPatternKind::Volley {
                count: 3,
                spread_degrees: 15.0,
                speed: 8.0,
                damage: 5.0,
            },
            cooldown,
            recovery_secs: 0.3,
        }
    }

    fn charge_pattern(cooldown: f32) -> AttackPattern {
        AttackPattern {
            kind: BossPatternKind::Charge {
                windup_secs: 1.0,
                speed: 10.0,
                duration_secs: 0.5,
            },
            cooldown,
            recovery_secs: 0.3,
        }
    }

    #[test]
    fn centered_fan_is_symmetric_around_aim() {
        let dirs = centered_fan(Vec2::X, 5, 15.0);
        assert_eq!(dirs.len(), 5);
        // Middle shot goes straight at the target
        assert!((dirs[2].x - 1.0).abs() < 1e-5);
        // Outermost shots sit at -30 and +30 degrees
        let expected = 30.0_f32.to_radians();
        assert!((dirs[0].to_angle() + expected).abs() < 1e-4);
        assert!((dirs[4].to_angle() - expected).abs() < 1e-4);
    }

    #[test]
    fn single_shot_fan_aims_straight() {
        let dirs = centered_fan(Vec2::Y, 1, 20.0);
        assert_eq!(dirs.len(), 1);
        assert!((dirs[0] - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn first_cooldowns_start_at_half() {
        let brain = test_boss(vec![volley_pattern(4.0)]);
        assert_eq!(brain.pattern_timers[0], 2.0);
    }

    #[test]
    fn cooldown_resets_at_selection_not_completion() {
        let mut brain = test_boss(vec![volley_pattern(4.0)]);
        // Burn through the initial half cooldown; selection happens the
        // same step the timer reaches zero
        let actions = brain.advance(2.0, Vec2::X);
        assert!(actions
            .iter()
            .any(|a| matches!(a, BrainAction::Volley { .. })));
        // Timer restarted at full cooldown the moment the pattern fired,
        // while the boss is still in its brief execute phase
        assert!(matches!(brain.phase, BossPhase::Executing { .. }));
        assert!(brain.pattern_timers[0] > 3.9);
    }

    #[test]
    fn patterns_are_mutually_exclusive() {
        let mut brain = test_boss(vec![charge_pattern(1.0), volley_pattern(1.0)]);
        // Both come off cooldown at once; only the first (scan order) fires
        brain.advance(1.0, Vec2::X);
        let actions = brain.advance(0.01, Vec2::X);
        assert!(matches!(brain.phase, BossPhase::Windup { pattern: 0, .. }));
        assert!(!actions
            .iter()
            .any(|a| matches!(a, BrainAction::Volley { .. })));

        // Volley is ready but stays queued until the charge finishes
        let actions = brain.advance(0.5, Vec2::X);
        assert!(!actions
            .iter()
            .any(|a| matches!(a, BrainAction::Volley { .. })));
    }

    #[test]
    fn charge_locks_direction_at_windup_end() {
        let mut brain = test_boss(vec![charge_pattern(1.0)]);
        brain.advance(0.5, Vec2::X); // initial half cooldown elapses
        brain.advance(0.01, Vec2::X); // selection, windup starts

        // Player moves during the windup; only the final position matters
        brain.advance(0.5, Vec2::X);
        let actions = brain.advance(0.6, Vec2::Y);
        let dash = actions.iter().find_map(|a| match a {
            BrainAction::SetVelocity(v) if *v != Vec2::ZERO => Some(*v),
            _ => None,
        });
        let dash = dash.expect("charge should set a dash velocity");
        assert!((dash.normalize() - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn idle_boss_chases_player() {
        let mut brain = test_boss(vec![volley_pattern(100.0)]);
        let actions = brain.advance(0.016, Vec2::new(10.0, 0.0));
        assert_eq!(
            actions.as_slice(),
            &[BrainAction::SetVelocity(Vec2::X * 2.0)]
        );
    }

    #[test]
    fn finished_pattern_leads_into_recovery() {
        let mut brain = test_boss(vec![volley_pattern(4.0)]);
        brain.advance(2.0, Vec2::X); // volley fires, brief execute phase
        brain.advance(0.2, Vec2::X); // execute ends
        assert!(matches!(brain.phase, BossPhase::Recovery { .. }));

        // Still recovering; the boss does not start chasing
        let actions = brain.advance(0.1, Vec2::X);
        assert!(!actions
            .iter()
            .any(|a| matches!(a, BrainAction::SetVelocity(v) if *v != Vec2::ZERO)));

        brain.advance(0.3, Vec2::X);
        assert!(matches!(brain.phase, BossPhase::Idle));
    }

    #[test]
    fn in_flight_pattern_cooldown_does_not_tick() {
        let mut brain = test_boss(vec![charge_pattern(10.0)]);
        brain.advance(5.0, Vec2::X); // half cooldown elapses, charge selected
        assert!(matches!(brain.phase, BossPhase::Windup { .. }));
        assert_eq!(brain.pattern_timers[0], 10.0);

        // Windup and dash leave the restarted cooldown untouched
        brain.advance(0.5, Vec2::X);
        assert_eq!(brain.pattern_timers[0], 10.0);
        brain.advance(0.6, Vec2::X);
        assert!(matches!(brain.phase, BossPhase::Executing { .. }));
        assert_eq!(brain.pattern_timers[0], 10.0);
    }
}
