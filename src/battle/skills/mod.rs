//! Skill engine
//!
//! The skill book holds up to six skills. Active skills run on cooldowns
//! and emit activation events consumed by the delivery modules; passive
//! skills fold into the global stat multipliers. Leveling offers a small
//! random choice of eligible skills and the battle loop picks one.

pub mod area;
pub mod aura;
pub mod orbit;
pub mod projectile;

use bevy::prelude::*;

use crate::combat::events::{
    GlobalStatsChangedEvent, PlayerLeveledEvent, SkillActivationEvent, SkillAddedEvent,
    SkillLeveledEvent,
};
use crate::combat::log::{BattleLog, BattleLogEventType};

use super::components::{nearest_in_circle, GameRng, PlayerTracker};
use super::data::{FireDirection, GameData, PassiveStat, SkillDef, SkillKind, SkillLevelRow};
use super::enemy::Enemy;
use super::health::Health;
use super::player::{GlobalStats, Player};
use super::pool::Pooled;

/// Maximum skills in the book
pub const MAX_SKILLS: usize = 6;
/// Options offered per level-up
pub const CHOICES_PER_LEVEL: usize = 3;
/// How far active skills scan for a target
pub const TARGET_SCAN_RADIUS: f32 = 15.0;

/// A skill the player owns
#[derive(Debug, Clone)]
pub struct SkillInstance {
    pub def: SkillDef,
    /// 1-based level
    pub level: usize,
    /// Remaining cooldown; active skills fire at zero
    pub cooldown: f32,
}

impl SkillInstance {
    pub fn row(&self) -> &SkillLevelRow {
        self.def.row(self.level)
    }
}

/// Outcome of trying to add a skill to the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillChange {
    Added(usize),
    /// Slot and new level
    Leveled(usize, usize),
    AtMaxLevel,
    BookFull,
}

/// The player's equipped skills
#[derive(Resource, Default)]
pub struct SkillBook {
    pub slots: Vec<SkillInstance>,
}

impl SkillBook {
    pub fn find(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.def.name == name)
    }

    /// Add a new skill, or level it if already owned
    pub fn add_or_level(&mut self, def: &SkillDef) -> SkillChange {
        if let Some(slot) = self.find(&def.name) {
            let instance = &mut self.slots[slot];
            if instance.level >= instance.def.max_level() {
                return SkillChange::AtMaxLevel;
            }
            instance.level += 1;
            return SkillChange::Leveled(slot, instance.level);
        }
        if self.slots.len() >= MAX_SKILLS {
            return SkillChange::BookFull;
        }
        self.slots.push(SkillInstance {
            def: def.clone(),
            level: 1,
            cooldown: 0.0,
        });
        SkillChange::Added(self.slots.len() - 1)
    }
}

/// Base multipliers before passive skills, set once from the character
/// definition and permanent upgrades
#[derive(Resource, Debug, Clone, Default)]
pub struct BaseStats(pub GlobalStats);

/// Fold the book's passive skills into the base multipliers
pub fn recompute_global_stats(base: &GlobalStats, book: &SkillBook) -> GlobalStats {
    let mut damage_bonus = 0.0;
    let mut cooldown_bonus = 0.0;
    let mut area_bonus = 0.0;
    let mut speed_bonus = 0.0;
    let mut health_bonus = 0.0;

    for skill in &book.slots {
        if let SkillKind::Passive { stat } = skill.def.kind {
            let value = skill.row().value;
            match stat {
                PassiveStat::Damage => damage_bonus += value,
                PassiveStat::Cooldown => cooldown_bonus += value,
                PassiveStat::Area => area_bonus += value,
                PassiveStat::MoveSpeed => speed_bonus += value,
                PassiveStat::MaxHealth => health_bonus += value,
            }
        }
    }

    GlobalStats {
        damage_mult: base.damage_mult * (1.0 + damage_bonus),
        cooldown_mult: (base.cooldown_mult * (1.0 - cooldown_bonus)).max(0.1),
        area_mult: base.area_mult * (1.0 + area_bonus),
        move_speed_mult: base.move_speed_mult * (1.0 + speed_bonus),
        bonus_max_health: base.bonus_max_health + health_bonus,
    }
}

/// Angle offsets for a multi-shot activation.
///
/// The first shot flies straight at the aim direction; later shots
/// alternate to either side at growing multiples of the spread.
pub fn alternating_offsets(count: u32, spread_deg: f32) -> Vec<f32> {
    (0..count)
        .map(|i| {
            if i == 0 {
                0.0
            } else {
                let step = ((i + 1) / 2) as f32;
                let sign = if i % 2 == 1 { 1.0 } else { -1.0 };
                spread_deg * step * sign
            }
        })
        .collect()
}

/// Rotate a direction by degrees
pub fn rotate_deg(dir: Vec2, deg: f32) -> Vec2 {
    Vec2::from_angle(deg.to_radians()).rotate(dir)
}

fn needs_target(def: &SkillDef) -> bool {
    match &def.kind {
        SkillKind::Projectile { direction, .. } => *direction == FireDirection::Nearest,
        _ => false,
    }
}

/// Tick cooldowns and emit activations for projectile and area skills.
///
/// A skill that needs a target and finds none holds at zero cooldown and
/// retries every frame instead of wasting the activation.
pub fn tick_active_skills(
    time: Res<Time>,
    stats: Res<GlobalStats>,
    tracker: Res<PlayerTracker>,
    mut book: ResMut<SkillBook>,
    enemies: Query<(Entity, &Enemy, &Pooled, &Transform)>,
    mut activations: EventWriter<SkillActivationEvent>,
) {
    if !tracker.alive {
        return;
    }
    let dt = time.delta_secs();

    for (slot, skill) in book.slots.iter_mut().enumerate() {
        match &skill.def.kind {
            SkillKind::Projectile { .. } | SkillKind::Area => {}
            _ => continue,
        }

        skill.cooldown = (skill.cooldown - dt).max(0.0);
        if skill.cooldown > 0.0 {
            continue;
        }

        let target = if needs_target(&skill.def) {
            let found = nearest_in_circle(
                enemies
                    .iter()
                    .filter(|(_, enemy, pooled, _)| pooled.active && !enemy.is_dying())
                    .map(|(entity, _, _, transform)| {
                        (entity, transform.translation.truncate())
                    }),
                tracker.position,
                TARGET_SCAN_RADIUS,
            );
            match found {
                Some((_, pos)) => Some(pos),
                None => continue,
            }
        } else {
            None
        };

        skill.cooldown = skill.row().cooldown * stats.cooldown_mult;
        activations.send(SkillActivationEvent { slot, target });
    }
}

/// Skills a level-up may offer right now
pub fn eligible_skills<'a>(data: &'a GameData, book: &SkillBook) -> Vec<&'a SkillDef> {
    data.skills
        .iter()
        .filter(|def| match book.find(&def.name) {
            Some(slot) => book.slots[slot].level < def.max_level(),
            None => book.slots.len() < MAX_SKILLS,
        })
        .collect()
}

/// Resolve level-ups into skill picks.
///
/// Offers up to [`CHOICES_PER_LEVEL`] random eligible skills and takes one
/// at random, standing in for the player's menu choice during automated
/// battles.
pub fn auto_pick_skills_on_level(
    mut leveled: EventReader<PlayerLeveledEvent>,
    data: Res<GameData>,
    base: Res<BaseStats>,
    mut book: ResMut<SkillBook>,
    mut rng: ResMut<GameRng>,
    mut stats: ResMut<GlobalStats>,
    mut added_events: EventWriter<SkillAddedEvent>,
    mut leveled_events: EventWriter<SkillLeveledEvent>,
    mut stats_events: EventWriter<GlobalStatsChangedEvent>,
    mut log: ResMut<BattleLog>,
    mut player: Query<&mut Health, With<Player>>,
) {
    for _ in leveled.read() {
        let mut choices = eligible_skills(&data, &book);
        if choices.is_empty() {
            continue;
        }
        // Narrow to the offered set, then pick
        while choices.len() > CHOICES_PER_LEVEL {
            let drop = rng.random_index(choices.len());
            choices.swap_remove(drop);
        }
        let pick = choices[rng.random_index(choices.len())].clone();

        let change = book.add_or_level(&pick);
        let is_passive = matches!(pick.kind, SkillKind::Passive { .. });
        match change {
            SkillChange::Added(slot) => {
                added_events.send(SkillAddedEvent {
                    slot,
                    name: pick.name.clone(),
                });
                log.log(
                    BattleLogEventType::SkillChange,
                    format!("Learned {}", pick.name),
                );
            }
            SkillChange::Leveled(slot, level) => {
                leveled_events.send(SkillLeveledEvent { slot, level });
                log.log(
                    BattleLogEventType::SkillChange,
                    format!("{} reached level {}", pick.name, level),
                );
            }
            SkillChange::AtMaxLevel | SkillChange::BookFull => continue,
        }

        if is_passive {
            let old = stats.clone();
            *stats = recompute_global_stats(&base.0, &book);
            let health_delta = stats.bonus_max_health - old.bonus_max_health;
            if health_delta != 0.0 {
                if let Ok(mut health) = player.get_single_mut() {
                    health.max += health_delta;
                    health.current = (health.current + health_delta).min(health.max);
                }
            }
            stats_events.send(GlobalStatsChangedEvent);
        }
    }
}
