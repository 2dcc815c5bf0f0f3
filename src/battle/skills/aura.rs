//! Aura skills
//!
//! A permanent damage field glued to the player. The body entity lives for
//! the whole battle; its numbers re-derive whenever the skill levels or the
//! global multipliers change, never per frame.

use bevy::prelude::*;

use crate::combat::events::{
    EnemyDamageEvent, GlobalStatsChangedEvent, SkillAddedEvent, SkillLeveledEvent,
};

use super::super::components::{overlap_circle, OverlapBuf, PlayerTracker};
use super::super::data::SkillKind;
use super::super::enemy::Enemy;
use super::super::player::GlobalStats;
use super::super::pool::Pooled;
use super::SkillBook;

/// The field entity for one aura skill
#[derive(Component, Debug, Clone)]
pub struct AuraBody {
    /// Skill book slot this body belongs to
    pub slot: usize,
    pub damage: f32,
    pub radius: f32,
    pub tick_interval: f32,
    pub tick_timer: f32,
    pub hit_effect: Option<String>,
}

/// Create missing aura bodies and re-derive stats on change events
pub fn sync_aura_bodies(
    mut added: EventReader<SkillAddedEvent>,
    mut leveled: EventReader<SkillLeveledEvent>,
    mut stats_changed: EventReader<GlobalStatsChangedEvent>,
    book: Res<SkillBook>,
    stats: Res<GlobalStats>,
    mut commands: Commands,
    mut bodies: Query<&mut AuraBody>,
) {
    let changed =
        added.read().count() + leveled.read().count() + stats_changed.read().count();
    if changed == 0 {
        return;
    }

    for (slot, skill) in book.slots.iter().enumerate() {
        if skill.def.kind != SkillKind::Aura {
            continue;
        }
        let row = skill.row();
        let damage = row.damage * stats.damage_mult;
        let radius = row.radius * stats.area_mult;
        // Aura rows store the tick interval in the duration column
        let tick_interval = row.duration.max(0.1);

        let mut found = false;
        for mut body in bodies.iter_mut() {
            if body.slot == slot {
                body.damage = damage;
                body.radius = radius;
                body.tick_interval = tick_interval;
                found = true;
            }
        }
        if !found {
            commands.spawn((
                AuraBody {
                    slot,
                    damage,
                    radius,
                    tick_interval,
                    tick_timer: 0.0,
                    hit_effect: skill.def.hit_effect.clone(),
                },
                Transform::default(),
            ));
        }
    }
}

/// Follow the player and damage enemies inside the field on each tick
pub fn tick_auras(
    time: Res<Time>,
    tracker: Res<PlayerTracker>,
    mut bodies: Query<(&mut AuraBody, &mut Transform)>,
    enemies: Query<(Entity, &Enemy, &Pooled, &Transform), Without<AuraBody>>,
    mut damage_events: EventWriter<EnemyDamageEvent>,
) {
    let dt = time.delta_secs();
    let mut buf = OverlapBuf::new();

    for (mut body, mut transform) in bodies.iter_mut() {
        transform.translation = tracker.position.extend(0.0);

        body.tick_timer -= dt;
        if body.tick_timer > 0.0 {
            continue;
        }
        body.tick_timer += body.tick_interval;

        buf.clear();
        overlap_circle(
            enemies
                .iter()
                .filter(|(_, enemy, p, _)| p.active && !enemy.is_dying())
                .map(|(e, _, _, t)| (e, t.translation.truncate())),
            tracker.position,
            body.radius,
            &mut buf,
        );
        for (enemy_entity, enemy_pos) in buf.iter() {
            // Gentle push away from the player
            let knockback_dir = (*enemy_pos - tracker.position).normalize_or_zero();
            damage_events.send(EnemyDamageEvent {
                target: *enemy_entity,
                amount: body.damage,
                knockback_dir,
                hit_effect_key: body.hit_effect.clone(),
            });
        }
    }
}
