//! HordeSim - Survivors-style Battle Simulation Prototype
//!
//! A headless implementation of a top-down survival action game: one player
//! character fights waves of spawning enemies and periodically-spawning
//! bosses, gains experience, levels up, and equips autonomous skills
//! (projectiles, area zones, auras, orbiting bodies).
//!
//! Rendering, input devices, and UI are external collaborators; this library
//! exposes the gameplay simulation for testing and reuse.

pub mod battle;
pub mod cli;
pub mod combat;
pub mod headless;

// Re-export commonly used types
pub use battle::flow::GamePhase;
pub use combat::log::{BattleLog, BattleLogEventType};
pub use headless::HeadlessBattleConfig;
