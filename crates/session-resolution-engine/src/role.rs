//! Role derivation for resolved identities.
//!
//! Role derivation is total and deterministic: for any profile/email
//! combination it produces a role string, falling back to email-local
//! inference and finally to the employee role.

/// Administrative role.
pub const ROLE_ADMIN: &str = "admin";
/// Store owner role.
pub const ROLE_STORE_OWNER: &str = "store_owner";
/// HR team role.
pub const ROLE_HR_TEAM: &str = "hr_team";
/// Default role for everyone else.
pub const ROLE_EMPLOYEE: &str = "employee";

/// Infer a role from the structure of an email address.
///
/// Precedence when multiple substrings match: admin > owner > hr >
/// employee. Used whenever the profile lookup fails or carries no role.
pub fn infer_role_from_email(email: &str) -> &'static str {
    if email.contains("admin@") {
        ROLE_ADMIN
    } else if email.contains("owner@") {
        ROLE_STORE_OWNER
    } else if email.contains("hr@") {
        ROLE_HR_TEAM
    } else {
        ROLE_EMPLOYEE
    }
}

/// Derive the effective role from an optional profile role and an email.
///
/// An explicit profile role wins; the literal `"admin"` is passed
/// through unchanged rather than widened. A missing or blank profile
/// role falls back to email inference.
pub fn derive_role(profile_role: Option<&str>, email: &str) -> String {
    match profile_role {
        Some(role) if !role.trim().is_empty() => role.to_string(),
        _ => infer_role_from_email(email).to_string(),
    }
}
