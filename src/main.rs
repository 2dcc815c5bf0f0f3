//! HordeSim - Survivors-style Battle Simulation Prototype
//!
//! Runs headless battles from a JSON configuration. Rendering and input
//! are out of scope; a presentation layer would embed the library instead.

use hordesim::cli;
use hordesim::headless::{run_headless_battle, HeadlessBattleConfig};

fn main() {
    let args = cli::parse_args();

    let mut config = match &args.headless {
        Some(path) => match HeadlessBattleConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading battle config: {}", e);
                std::process::exit(1);
            }
        },
        None => HeadlessBattleConfig::default(),
    };

    if let Some(output) = &args.output {
        config.output_path = Some(output.to_string_lossy().to_string());
    }
    if args.headless.is_none() {
        config.max_duration_secs = args.max_duration;
    }

    if let Err(e) = run_headless_battle(config) {
        eprintln!("Battle failed: {}", e);
        std::process::exit(1);
    }
}
