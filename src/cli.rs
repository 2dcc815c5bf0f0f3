//! Command-line interface for HordeSim
//!
//! The simulation runs headless only; presentation layers consume the
//! library directly.

use clap::Parser;
use std::path::PathBuf;

/// Survivors-style battle simulator
#[derive(Parser, Debug)]
#[command(name = "hordesim")]
#[command(about = "Survivors-style battle simulator")]
#[command(version)]
pub struct Args {
    /// Run a battle from the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the battle log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum battle duration in seconds
    #[arg(long, default_value = "300")]
    pub max_duration: f32,
}

pub fn parse_args() -> Args {
    Args::parse()
}
