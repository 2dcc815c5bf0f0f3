//! Battle flow
//!
//! The phase state machine and the battle clock. Simulation systems run
//! only while the battle is in the `Playing` phase; the clock drives wave
//! and boss scheduling.

use bevy::prelude::*;

use crate::combat::log::BattleLog;

/// Lifecycle phase of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// Configured but not started
    #[default]
    Ready,
    Playing,
    Paused,
    /// Terminal; a new battle requires a fresh state
    GameOver,
}

/// Current phase with guarded transitions.
///
/// Each transition method returns whether it applied; callers can ignore
/// the result or log a rejected transition, but the phase never moves
/// along an edge the machine does not define.
#[derive(Resource, Debug, Default)]
pub struct BattlePhase {
    pub phase: GamePhase,
}

impl BattlePhase {
    pub fn start(&mut self) -> bool {
        if self.phase == GamePhase::Ready {
            self.phase = GamePhase::Playing;
            true
        } else {
            false
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
            true
        } else {
            false
        }
    }

    pub fn end(&mut self) -> bool {
        match self.phase {
            GamePhase::Playing | GamePhase::Paused => {
                self.phase = GamePhase::GameOver;
                true
            }
            _ => false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}

/// Elapsed battle time in seconds. Advances only while playing.
#[derive(Resource, Debug, Default)]
pub struct BattleClock {
    pub elapsed: f32,
}

/// Tracks which of the catalog's scheduled boss entries have fired. Each
/// entry fires exactly once, in order, as the battle clock passes it.
#[derive(Resource, Debug, Default)]
pub struct BossSchedule {
    /// Index of the next unconsumed entry in the catalog's schedule
    pub next_index: usize,
}

/// Advance the battle clock and keep the log's timestamp base in sync
pub fn tick_battle_clock(
    time: Res<Time>,
    phase: Res<BattlePhase>,
    mut clock: ResMut<BattleClock>,
    mut log: ResMut<BattleLog>,
) {
    if phase.is_playing() {
        clock.elapsed += time.delta_secs();
        log.battle_time = clock.elapsed;
    }
}

/// Run condition: the battle is in the `Playing` phase
pub fn battle_is_playing(phase: Res<BattlePhase>) -> bool {
    phase.is_playing()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_machine_follows_defined_edges() {
        let mut phase = BattlePhase::default();
        assert_eq!(phase.phase, GamePhase::Ready);

        // Cannot pause, resume, or end before starting
        assert!(!phase.pause());
        assert!(!phase.resume());
        assert!(!phase.end());

        assert!(phase.start());
        assert!(!phase.start());
        assert!(phase.pause());
        assert!(!phase.pause());
        assert!(phase.resume());
        assert!(phase.end());
        assert_eq!(phase.phase, GamePhase::GameOver);
    }

    #[test]
    fn game_over_is_terminal() {
        let mut phase = BattlePhase::default();
        phase.start();
        phase.end();

        assert!(!phase.start());
        assert!(!phase.pause());
        assert!(!phase.resume());
        assert!(!phase.end());
        assert_eq!(phase.phase, GamePhase::GameOver);
    }

    #[test]
    fn end_applies_from_paused() {
        let mut phase = BattlePhase::default();
        phase.start();
        phase.pause();
        assert!(phase.end());
    }
}
