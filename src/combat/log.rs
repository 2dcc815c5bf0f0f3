//! Battle logging
//!
//! Records all battle events for display and post-battle analysis.

use bevy::prelude::*;
use serde::Serialize;

/// A single entry in the battle log
#[derive(Debug, Clone, Serialize)]
pub struct BattleLogEntry {
    /// Timestamp in battle time (seconds since battle start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: BattleLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of battle log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BattleLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Enemy or player died
    Death,
    /// Player gained a level
    LevelUp,
    /// Wave transition
    WaveChange,
    /// Boss entered the battle
    BossSpawn,
    /// Skill acquired or leveled
    SkillChange,
    /// Battle event (start, end, etc.)
    BattleEvent,
}

/// Metadata written alongside the log entries when saving to a file
#[derive(Debug, Clone, Serialize)]
pub struct BattleSummary {
    /// Character played
    pub character_name: String,
    /// Whether the player was still alive at battle end
    pub survived: bool,
    /// Total battle duration in seconds
    pub battle_time: f32,
    /// Final player level
    pub final_level: u32,
    /// Total enemies killed
    pub kills: u32,
    /// Random seed used, if the battle was deterministic
    pub random_seed: Option<u64>,
}

#[derive(Serialize)]
struct BattleLogFile<'a> {
    summary: &'a BattleSummary,
    entries: &'a [BattleLogEntry],
}

/// The battle log resource storing all events
#[derive(Resource, Default)]
pub struct BattleLog {
    /// All log entries in chronological order
    pub entries: Vec<BattleLogEntry>,
    /// Current battle time
    pub battle_time: f32,
}

impl BattleLog {
    /// Clear the log for a new battle
    pub fn clear(&mut self) {
        self.entries.clear();
        self.battle_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: BattleLogEventType, message: String) {
        self.entries.push(BattleLogEntry {
            timestamp: self.battle_time,
            event_type,
            message,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: BattleLogEventType) -> Vec<&BattleLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&BattleLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Save the log as JSON. Returns the filename written.
    ///
    /// If no output path is given, a timestamped filename in the current
    /// directory is used.
    pub fn save_to_file(
        &self,
        summary: &BattleSummary,
        output_path: Option<&str>,
    ) -> Result<String, String> {
        let filename = match output_path {
            Some(path) => path.to_string(),
            None => {
                let secs = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                format!("battle_log_{}.json", secs)
            }
        };

        let file = BattleLogFile {
            summary,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("Failed to serialize battle log: {}", e))?;
        std::fs::write(&filename, json)
            .map_err(|e| format!("Failed to write {}: {}", filename, e))?;

        Ok(filename)
    }
}
