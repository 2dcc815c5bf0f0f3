//! Wave scheduling
//!
//! Waves are time-indexed entries in the catalog: the current wave is the
//! last entry whose start time has passed. Before the first entry's start
//! time there is no current wave and nothing spawns.

use bevy::prelude::*;

use crate::combat::events::WaveChangedEvent;
use crate::combat::log::{BattleLog, BattleLogEventType};

use super::data::{GameData, WaveEntry};
use super::flow::BattleClock;

/// Index of the wave active at `elapsed`, or None before the first wave.
///
/// Entries are expected in ascending `start_time` order; the last entry
/// whose start time has passed wins.
pub fn wave_index_at(waves: &[WaveEntry], elapsed: f32) -> Option<usize> {
    let mut current = None;
    for (i, wave) in waves.iter().enumerate() {
        if elapsed >= wave.start_time {
            current = Some(i);
        }
    }
    current
}

/// Tracks which wave is current and the spawn cadence within it
#[derive(Resource, Debug, Default)]
pub struct WaveState {
    /// Current wave index, None before the first wave starts
    pub current: Option<usize>,
    /// Counts down to the next spawn
    pub spawn_timer: f32,
}

/// Advance the current wave from the battle clock
pub fn advance_wave(
    clock: Res<BattleClock>,
    data: Res<GameData>,
    mut state: ResMut<WaveState>,
    mut wave_events: EventWriter<WaveChangedEvent>,
    mut log: ResMut<BattleLog>,
) {
    let index = wave_index_at(&data.waves, clock.elapsed);
    if index != state.current {
        state.current = index;
        // New wave spawns immediately
        state.spawn_timer = 0.0;
        if let Some(index) = index {
            wave_events.send(WaveChangedEvent { index });
            log.log(
                BattleLogEventType::WaveChange,
                format!("Wave {} started", index + 1),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::data::GameData;

    #[test]
    fn wave_index_tracks_start_times() {
        let waves = GameData::builtin().waves;
        // Builtin waves start at 0, 30, and 90 seconds
        assert_eq!(wave_index_at(&waves, 0.0), Some(0));
        assert_eq!(wave_index_at(&waves, 29.9), Some(0));
        assert_eq!(wave_index_at(&waves, 30.0), Some(1));
        assert_eq!(wave_index_at(&waves, 89.9), Some(1));
        assert_eq!(wave_index_at(&waves, 90.0), Some(2));
        assert_eq!(wave_index_at(&waves, 1000.0), Some(2));
    }

    #[test]
    fn no_wave_before_first_start_time() {
        let mut waves = GameData::builtin().waves;
        waves[0].start_time = 5.0;
        assert_eq!(wave_index_at(&waves, 0.0), None);
        assert_eq!(wave_index_at(&waves, 4.99), None);
        assert_eq!(wave_index_at(&waves, 5.0), Some(0));
    }

    #[test]
    fn empty_schedule_has_no_wave() {
        assert_eq!(wave_index_at(&[], 100.0), None);
    }
}
