//! Identity Provider client for the Shiftwise session engine.
//!
//! This crate provides:
//! - The auth event model consumed by the resolution engine
//! - A dyn-safe `IdentityProvider` trait with subscription support
//! - A Supabase GoTrue REST implementation with in-process event fan-out
//! - An `AccessTokenProvider` seam for data-store clients

mod error;
mod events;
mod provider;
mod supabase;

pub use error::{IdentityError, IdentityResult};
pub use events::{AuthEvent, AuthEventKind, IdentityUser, Session, UserMetadata};
pub use provider::{AccessTokenProvider, AuthEventSubscription, IdentityProvider};
pub use supabase::{SupabaseIdentityClient, SupabaseSession};
