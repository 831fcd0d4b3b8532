//! Integration tests for the resolution engine.
//!
//! Test organization:
//!
//! - `harness.rs`         - Mock identity provider / profile store and helpers
//! - `events.rs`          - Event handling (sign-out, token refresh, reloads)
//! - `single_flight.rs`   - Single-flight load deduplication
//! - `timeouts.rs`        - Per-load and global safety timers
//! - `initial_session.rs` - Initial session idempotence and the fallback check
//! - `scenarios.rs`       - End-to-end resolution scenarios

pub(crate) mod harness;
mod single_flight;

// Re-exports for external test usage if needed
#[allow(unused_imports)]
pub use harness::{MockIdentityProvider, MockProfileStore, TestHarness};
