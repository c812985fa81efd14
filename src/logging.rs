// src/logging.rs
//! Installs the global `tracing` subscriber for the binary.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Maps `-v` occurrences to a level: none is info, one is debug, more is trace.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `RUST_LOG` wins over the verbosity flags. Dependencies stay at `warn`.
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        EnvFilter::new(format!("warn,recorddesk={}", level))
    })
}

/// Logs go to stderr so command output on stdout stays pipeable.
pub fn init(verbosity: u8) {
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    let _ = tracing_subscriber::registry()
        .with(env_filter(level_from_verbosity(verbosity)))
        .with(layer)
        .try_init();
}
