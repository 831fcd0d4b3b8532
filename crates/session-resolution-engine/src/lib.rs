//! # Session Resolution Engine
//!
//! Consumes the identity provider's auth event stream and derives a
//! stable "who is this user and what should they see" decision under
//! timeouts and partial failures.
//!
//! ## Core Invariants
//!
//! 1. **Liveness over correctness**: `is_loading` becomes false within
//!    the global timeout of engine start, unconditionally.
//! 2. **Single-flight**: at most one profile load is in flight at any
//!    time; concurrent duplicates are dropped, not queued.
//! 3. **Idempotent under duplicates**: replayed events (including
//!    `InitialSession`) have no effect beyond their first delivery.
//! 4. **Sign-out wins**: a `SignedOut` event settles the state
//!    immediately, and results of in-flight loads for the previous
//!    session are discarded.
//! 5. **No surfaced errors**: every failure is logged and becomes a
//!    state transition, never an error on the public surface.
//!
//! ## Architecture
//!
//! ```text
//! Identity Provider ──events──► Engine ──deferred──► Profile Loader
//!        ▲                        │                       │
//!        └──── session/user ──────┴──── snapshot ──► Presentation
//! ```

mod engine;
mod loader;
mod navigation;
mod resolution_fsm;
mod role;
mod timers;
mod types;

#[cfg(test)]
mod tests;

pub use engine::{ResolutionConfig, ResolutionEngine};
pub use loader::{resolve_outcome, LoadOutcome};
pub use navigation::{navigation_target, target_for_role, NavigationTarget};
pub use resolution_fsm::resolution_machine;
pub use resolution_fsm::{
    ResolutionInput, ResolutionMachine, ResolutionMachineState, ResolutionState,
};
pub use role::{
    derive_role, infer_role_from_email, ROLE_ADMIN, ROLE_EMPLOYEE, ROLE_HR_TEAM, ROLE_STORE_OWNER,
};
pub use timers::TimeoutSupervisor;
pub use types::{NavigationCallback, ResolutionSnapshot, ResolvedIdentity};
