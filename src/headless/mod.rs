//! Headless mode for agentic testing
//!
//! This module provides functionality to run battles without any graphical
//! output, suitable for automated testing and AI agent integration.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless battle
//! cargo run --release -- --headless battle_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "character": "Knight",
//!   "skills": ["Fire Bolt", "Frost Aura"],
//!   "max_duration_secs": 180,
//!   "random_seed": 42
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessBattleConfig;
pub use runner::{build_battle_app, run_headless_battle, BattleResult, HeadlessBattleState};
