//! Core configuration and utilities for the Shiftwise session engine.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, ResolutionTimingConfig, DEFAULT_LOG_LEVEL, DEFAULT_SUPABASE_PUBLISHABLE_KEY,
    DEFAULT_SUPABASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
