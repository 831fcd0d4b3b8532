//! Presentation dispatcher boundary.
//!
//! The mobile/web product maps the navigation target to a concrete
//! screen tree; the shell logs the decision instead.

use session_resolution_engine::{NavigationCallback, NavigationTarget, ResolutionSnapshot};
use tracing::info;

/// Dispatcher that logs each navigation decision.
pub struct TracingDispatcher;

impl TracingDispatcher {
    /// Navigation callback to register on the engine.
    pub fn callback() -> NavigationCallback {
        Box::new(|snapshot| Self::dispatch(&snapshot))
    }

    fn dispatch(snapshot: &ResolutionSnapshot) {
        info!(
            is_loading = snapshot.is_loading,
            screen = Self::screen_name(snapshot.navigation_target),
            resolved_user_id = snapshot.resolved_user_id.as_deref().unwrap_or("-"),
            "Navigation decision"
        );
    }

    /// Screen tree name for a navigation target.
    pub fn screen_name(target: NavigationTarget) -> &'static str {
        match target {
            NavigationTarget::Auth => "auth",
            NavigationTarget::ForcedPasswordChange => "forced-password-change",
            NavigationTarget::StoreOwner => "store-owner-home",
            NavigationTarget::Hr => "hr-home",
            NavigationTarget::Admin => "admin-home",
            NavigationTarget::Employee => "employee-home",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_name_covers_every_target() {
        assert_eq!(TracingDispatcher::screen_name(NavigationTarget::Auth), "auth");
        assert_eq!(
            TracingDispatcher::screen_name(NavigationTarget::ForcedPasswordChange),
            "forced-password-change"
        );
        assert_eq!(
            TracingDispatcher::screen_name(NavigationTarget::StoreOwner),
            "store-owner-home"
        );
        assert_eq!(TracingDispatcher::screen_name(NavigationTarget::Hr), "hr-home");
        assert_eq!(
            TracingDispatcher::screen_name(NavigationTarget::Admin),
            "admin-home"
        );
        assert_eq!(
            TracingDispatcher::screen_name(NavigationTarget::Employee),
            "employee-home"
        );
    }
}
