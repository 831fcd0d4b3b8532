//! Logging initialization for the engine shell.
//!
//! All services in this workspace are log producers only: they call
//! `init_logging` once at startup and use standard `tracing` macros
//! throughout. Output goes to stderr with an `EnvFilter` so `RUST_LOG`
//! can override the configured default at runtime.

use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// # Arguments
///
/// * `level` - Default log level (trace, debug, info, warn, error)
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("Shell started");
/// ```
pub fn init_logging(level: &str) {
    init_logging_for_service("shiftwise", level);
}

/// Initialize logging with a custom service name.
///
/// Use this when you need to distinguish between different components
/// in the central log stream.
pub fn init_logging_for_service(service_name: &str, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_level(level).to_string().to_lowercase()));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();

    if result.is_ok() {
        tracing::debug!(service = service_name, "Logging initialized");
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
