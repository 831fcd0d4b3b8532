//! Resolution decision logic for a completed profile load.
//!
//! The effectful half of the loader (guard, timer, concurrent fetches)
//! lives in the engine; this module is the pure decision step that turns
//! the two fetch results into an outcome. The current-user fetch runs
//! concurrently with the profile fetch and doubles as the fallback
//! source when the profile lookup fails.

use crate::role::derive_role;
use crate::types::ResolvedIdentity;
use identity_client::{IdentityError, IdentityUser};
use profile_store::{ProfileRecord, ProfileStoreError};
use tracing::{debug, warn};

/// Outcome of one profile load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Identity resolved (possibly via email fallback).
    Resolved(ResolvedIdentity),
    /// Total resolution failure: treat as not signed in.
    Unauthenticated,
}

/// Decide the outcome of a load from its two fetch results.
///
/// Deterministic and total:
/// - an explicit profile role wins, otherwise the role is inferred from
///   the best available email (profile first, then the provider's user
///   record);
/// - `must_change_password` on the user record short-circuits to a
///   forced-password-change resolution regardless of the profile
///   outcome;
/// - when neither fetch produced a usable record, the user is treated
///   as not signed in.
pub fn resolve_outcome(
    user_id: &str,
    profile: Result<Option<ProfileRecord>, ProfileStoreError>,
    user: Result<Option<IdentityUser>, IdentityError>,
) -> LoadOutcome {
    let user = match user {
        Ok(user) => user,
        Err(err) => {
            warn!(user_id = %user_id, error = %err, "Current-user fetch failed during resolution");
            None
        }
    };

    let profile = match profile {
        Ok(profile) => profile,
        Err(err) => {
            warn!(
                user_id = %user_id,
                error = %err,
                "Profile fetch failed, falling back to identity user record"
            );
            None
        }
    };

    if profile.is_none() && user.is_none() {
        return LoadOutcome::Unauthenticated;
    }

    let must_change_password = user
        .as_ref()
        .map(|u| u.metadata.must_change_password)
        .unwrap_or(false);

    let email = profile
        .as_ref()
        .and_then(|p| p.email.clone())
        .or_else(|| user.as_ref().and_then(|u| u.email.clone()))
        .unwrap_or_default();

    let profile_role = profile.as_ref().and_then(|p| p.role.as_deref());
    let role = derive_role(profile_role, &email);

    debug!(user_id = %user_id, role = %role, must_change_password, "Resolution decided");

    LoadOutcome::Resolved(ResolvedIdentity {
        user_id: user_id.to_string(),
        role,
        must_change_password,
    })
}
