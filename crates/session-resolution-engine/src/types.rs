//! Core types produced by the resolution engine.

use crate::navigation::NavigationTarget;
use serde::Serialize;

/// The stable output of a successful resolution.
///
/// Owned exclusively by the engine; replaced (never merged) on every
/// successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub user_id: String,
    pub role: String,
    pub must_change_password: bool,
}

/// Value object handed to the presentation dispatcher on every state
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionSnapshot {
    /// True while the UI should show its loading state.
    pub is_loading: bool,
    /// Which top-level screen set to mount.
    pub navigation_target: NavigationTarget,
    /// The resolved user id, if any.
    pub resolved_user_id: Option<String>,
}

/// Callback type for navigation snapshot notifications.
pub type NavigationCallback = Box<dyn Fn(ResolutionSnapshot) + Send + Sync>;
