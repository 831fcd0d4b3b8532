//! Profile Store client for the Shiftwise session engine.
//!
//! The profile store maps a user identifier to the application-level
//! record (role, email, full name) kept separately from the identity
//! provider. This crate provides the dyn-safe `ProfileStore` trait and
//! a Supabase PostgREST implementation.

mod error;
mod supabase;

pub use error::{ProfileStoreError, ProfileStoreResult};
pub use supabase::SupabaseProfileStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Application-level profile record for a user.
///
/// Fetched on demand and never cached beyond the current resolution
/// cycle; every triggering auth event causes a fresh fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Point lookup into the profile store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for a user id.
    ///
    /// Returns `Ok(None)` when no profile row exists for that id.
    async fn get_profile(&self, user_id: &str) -> ProfileStoreResult<Option<ProfileRecord>>;
}
