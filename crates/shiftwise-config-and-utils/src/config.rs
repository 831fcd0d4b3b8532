//! Configuration management for the session engine shell.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default Supabase URL (can be overridden at compile time via SUPABASE_URL env var).
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "https://random.supabase.co",
};

/// Default Supabase publishable key (can be overridden at compile time via SUPABASE_PUBLISHABLE_KEY env var).
pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str = match option_env!("SUPABASE_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "random-key",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Timing knobs for session/role resolution.
///
/// All three timers are one-shot. The per-load timer bounds a single
/// profile load; the global timer bounds time-to-first-screen; the
/// fallback delay bounds how long the engine waits for the identity
/// provider to announce the initial session on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTimingConfig {
    /// Per-load safety timeout in milliseconds.
    #[serde(default = "default_per_load_timeout_ms")]
    pub per_load_timeout_ms: u64,
    /// Global safety timeout in milliseconds.
    #[serde(default = "default_global_timeout_ms")]
    pub global_timeout_ms: u64,
    /// Fallback session check delay in milliseconds.
    #[serde(default = "default_fallback_session_check_ms")]
    pub fallback_session_check_ms: u64,
}

fn default_per_load_timeout_ms() -> u64 {
    5_000
}

fn default_global_timeout_ms() -> u64 {
    6_000
}

fn default_fallback_session_check_ms() -> u64 {
    1_500
}

impl Default for ResolutionTimingConfig {
    fn default() -> Self {
        Self {
            per_load_timeout_ms: default_per_load_timeout_ms(),
            global_timeout_ms: default_global_timeout_ms(),
            fallback_session_check_ms: default_fallback_session_check_ms(),
        }
    }
}

/// Main shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase publishable API key (public, safe to expose).
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
    /// Session/role resolution timing.
    #[serde(default)]
    pub resolution: ResolutionTimingConfig,
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            supabase_publishable_key: DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string(),
            resolution: ResolutionTimingConfig::default(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, falling back to defaults.
    /// Note: supabase_url and supabase_publishable_key are
    /// compile-time only and will always use the built-in defaults,
    /// regardless of what's in the config file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        // Force compile-time values (never from config file)
        config.supabase_url = DEFAULT_SUPABASE_URL.to_string();
        config.supabase_publishable_key = DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string();

        // Environment variables can only override log_level
        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    /// Note: supabase_url and supabase_publishable_key are compile-time
    /// only (set via env vars during build). Only log_level can be
    /// overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("SHIFTWISE_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Get the Supabase URL as a parsed URL.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }
}
