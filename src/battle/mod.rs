//! Battle simulation
//!
//! The core gameplay loop: pooled enemies chase the player, skills fire
//! autonomously, bosses run attack patterns, and experience feeds leveling.
//! All systems are wired through [`systems`], the stable API used by both
//! the headless runner and any presentation layer.

pub mod boss;
pub mod components;
pub mod data;
pub mod effects;
pub mod enemy;
pub mod flow;
pub mod health;
pub mod pickups;
pub mod player;
pub mod pool;
pub mod progress;
pub mod skills;
pub mod spawner;
pub mod systems;
pub mod waves;
