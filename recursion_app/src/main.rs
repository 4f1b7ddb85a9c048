//! Recursion Visualized
//!
//! Opens a window and animates the call stack of a recursive function: a box climbs
//! the screen in lime as frames are pushed, and walks back down in pink as they are
//! popped. Closing the window ends the program at any point.

use std::process::ExitCode;

use recursion_engine::config::{VisualizerConfig, CONFIG_CANDIDATES};
use recursion_engine::foundation::logging;
use recursion_engine::render::VulkanDisplay;
use recursion_engine::session::{self, SetupError};

fn main() -> ExitCode {
    // The logger's filter comes from the file, so loading happens before logging exists.
    let source = VisualizerConfig::locate(&CONFIG_CANDIDATES);
    let config = VisualizerConfig::discover(&CONFIG_CANDIDATES);

    let filter = config
        .as_ref()
        .map_or_else(|_| "info".to_string(), |config| config.logging.filter.clone());
    logging::init(&filter);

    log::info!("Starting Recursion Visualized");
    match source {
        Some(path) => log::info!("Configuration from {}", path),
        None => log::info!("No configuration file, using defaults"),
    }

    let result = session::run(move || {
        let config = config.map_err(SetupError::from)?;
        VulkanDisplay::open(&config)
    });

    session::report(&result).into()
}
