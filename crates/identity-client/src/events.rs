//! Auth event model shared between the identity provider and the engine.

use serde::{Deserialize, Serialize};

/// Kind of authentication event emitted by the identity provider.
///
/// The provider may emit more than one event for logically equivalent
/// transitions (e.g. a `SignedIn` shortly after an `InitialSession` for
/// the same login); consumers must be idempotent under duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    InitialSession,
    UserUpdated,
    PasswordRecovery,
}

/// Ephemeral session owned by the identity provider.
///
/// The engine only ever reads this; it never mutates or stores it beyond
/// the current resolution cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

/// An authentication event with its optional session payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

/// Metadata flags stored on the identity provider's user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// The user must change their password before reaching normal screens.
    #[serde(default)]
    pub must_change_password: bool,
}

/// The identity provider's view of the current user.
///
/// This is a second, independent read from the provider, distinct from
/// the application profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: UserMetadata,
}
