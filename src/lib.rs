// atopflux Library - Public API

// Re-export error types
pub mod error;
pub use error::{CollectorError, Result};

// Module declarations
pub mod commands;
pub mod core;

// Re-export commonly used types
pub use crate::core::config::Config;

// Initialize logging; RUST_LOG still overrides the default level
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
