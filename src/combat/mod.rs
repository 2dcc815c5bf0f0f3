//! Combat events and logging
//!
//! Notification fan-out for the simulation: health changes, deaths, level
//! ups, wave transitions, and skill changes are published as typed events
//! consumed by the battle systems and by presentation layers, with a
//! timestamped battle log for post-battle analysis.

pub mod events;
pub mod log;
