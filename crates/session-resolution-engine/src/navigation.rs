//! Navigation target selection.
//!
//! A total, side-effect-free function of resolution state and resolved
//! identity. Unrecognized roles always route to the employee screens,
//! never to an error.

use crate::resolution_fsm::ResolutionState;
use crate::types::ResolvedIdentity;
use serde::{Deserialize, Serialize};

/// The abstract decision of which top-level screen set to mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationTarget {
    /// Sign-in / sign-up screens.
    Auth,
    /// The forced password change screen.
    ForcedPasswordChange,
    /// Store owner screen set.
    StoreOwner,
    /// HR team screen set.
    Hr,
    /// Administration screen set.
    Admin,
    /// Employee screen set (default fallback).
    Employee,
}

/// Select the navigation target for a resolution state and identity.
pub fn navigation_target(
    state: ResolutionState,
    resolved: Option<&ResolvedIdentity>,
) -> NavigationTarget {
    match state {
        ResolutionState::Unauthenticated => NavigationTarget::Auth,
        ResolutionState::ForcedPasswordChange => match resolved {
            Some(_) => NavigationTarget::ForcedPasswordChange,
            // Unreachable through the engine, but the function is total.
            None => NavigationTarget::Auth,
        },
        _ => match resolved {
            Some(identity) => target_for_role(&identity.role),
            None => NavigationTarget::Auth,
        },
    }
}

/// Route an authenticated role string to its screen set.
pub fn target_for_role(role: &str) -> NavigationTarget {
    match role {
        "store_owner" => NavigationTarget::StoreOwner,
        "hr_team" | "hr" => NavigationTarget::Hr,
        "super_admin" | "admin" => NavigationTarget::Admin,
        _ => NavigationTarget::Employee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: &str) -> ResolvedIdentity {
        ResolvedIdentity {
            user_id: "user-1".to_string(),
            role: role.to_string(),
            must_change_password: false,
        }
    }

    #[test]
    fn unauthenticated_routes_to_auth() {
        assert_eq!(
            navigation_target(ResolutionState::Unauthenticated, Some(&identity("admin"))),
            NavigationTarget::Auth
        );
        assert_eq!(
            navigation_target(ResolutionState::Unauthenticated, None),
            NavigationTarget::Auth
        );
    }

    #[test]
    fn forced_password_change_with_identity() {
        assert_eq!(
            navigation_target(
                ResolutionState::ForcedPasswordChange,
                Some(&identity("employee"))
            ),
            NavigationTarget::ForcedPasswordChange
        );
    }

    #[test]
    fn forced_password_change_without_identity_is_total() {
        assert_eq!(
            navigation_target(ResolutionState::ForcedPasswordChange, None),
            NavigationTarget::Auth
        );
    }

    #[test]
    fn authenticated_routes_by_role() {
        assert_eq!(
            navigation_target(ResolutionState::Authenticated, Some(&identity("store_owner"))),
            NavigationTarget::StoreOwner
        );
        assert_eq!(
            navigation_target(ResolutionState::Authenticated, Some(&identity("hr_team"))),
            NavigationTarget::Hr
        );
        assert_eq!(
            navigation_target(ResolutionState::Authenticated, Some(&identity("hr"))),
            NavigationTarget::Hr
        );
        assert_eq!(
            navigation_target(ResolutionState::Authenticated, Some(&identity("admin"))),
            NavigationTarget::Admin
        );
        assert_eq!(
            navigation_target(ResolutionState::Authenticated, Some(&identity("super_admin"))),
            NavigationTarget::Admin
        );
    }

    #[test]
    fn unrecognized_role_falls_back_to_employee() {
        assert_eq!(
            navigation_target(ResolutionState::Authenticated, Some(&identity("intern"))),
            NavigationTarget::Employee
        );
        assert_eq!(
            navigation_target(ResolutionState::Authenticated, Some(&identity(""))),
            NavigationTarget::Employee
        );
    }

    #[test]
    fn loading_without_identity_looks_unauthenticated() {
        // While loading with nothing resolved yet, the target mirrors
        // the pre-load auth state rather than erroring.
        assert_eq!(
            navigation_target(ResolutionState::Loading, None),
            NavigationTarget::Auth
        );
        assert_eq!(
            navigation_target(ResolutionState::Loading, Some(&identity("store_owner"))),
            NavigationTarget::StoreOwner
        );
    }
}
