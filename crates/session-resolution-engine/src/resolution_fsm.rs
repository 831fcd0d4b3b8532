//! Session resolution state machine using rust-fsm.
//!
//! This module defines an explicit finite state machine for session/role
//! resolution, replacing implicit state derivation from loading flags.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────────┐ EngineStarted ┌─────────────┐
//! │ Initializing │ ─────────────►│   Loading   │◄──── BeginLoad (re-entry
//! └──────────────┘               └──────┬──────┘      from any settled state)
//!                                       │
//!         ResolvedOk / TimeoutAuthenticated ──► Authenticated
//!         ResolvedPasswordChange / TimeoutPasswordChange ──► ForcedPasswordChange
//!         ResolutionFailed / NoInitialSession / TimeoutUnauthenticated ──► Unauthenticated
//!
//! SignedOut: every state ──► Unauthenticated
//! ```
//!
//! Settled states (`Authenticated`, `ForcedPasswordChange`,
//! `Unauthenticated`) are never terminal: a new triggering event
//! re-enters `Loading` via `BeginLoad`.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

// Define the FSM using rust-fsm's declarative macro
// This generates a module `resolution_machine` with:
// - resolution_machine::State (enum)
// - resolution_machine::Input (enum)
// - resolution_machine::StateMachine (type alias)
// - resolution_machine::Impl (trait impl)
state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub resolution_machine(Initializing)

    Initializing => {
        EngineStarted => Loading,
        BeginLoad => Loading,
        SignedOut => Unauthenticated,
        TimeoutUnauthenticated => Unauthenticated
    },
    Loading => {
        // A triggering event while already loading keeps the state;
        // the single-flight guard decides whether a fetch starts.
        BeginLoad => Loading,
        ResolvedOk => Authenticated,
        ResolvedPasswordChange => ForcedPasswordChange,
        ResolutionFailed => Unauthenticated,
        NoInitialSession => Unauthenticated,
        SignedOut => Unauthenticated,
        TimeoutAuthenticated => Authenticated,
        TimeoutPasswordChange => ForcedPasswordChange,
        TimeoutUnauthenticated => Unauthenticated
    },
    Authenticated => {
        BeginLoad => Loading,
        SignedOut => Unauthenticated
    },
    ForcedPasswordChange => {
        BeginLoad => Loading,
        SignedOut => Unauthenticated
    },
    Unauthenticated => {
        BeginLoad => Loading,
        SignedOut => Unauthenticated
    }
}

// Re-export the generated types with clearer names
pub use resolution_machine::Input as ResolutionInput;
pub use resolution_machine::State as ResolutionMachineState;
pub use resolution_machine::StateMachine as ResolutionMachine;

/// User-facing resolution state for snapshots and diagnostics.
///
/// This is a simplified view of the FSM state for the presentation
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    /// Engine created, first transition not yet driven.
    Initializing,
    /// Resolution in progress; the UI shows its loading state.
    Loading,
    /// Resolved with a role; normal screens.
    Authenticated,
    /// Resolved, but the user must change their password first.
    ForcedPasswordChange,
    /// No valid session.
    Unauthenticated,
}

impl ResolutionState {
    /// Returns true while the UI should show a loading state.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ResolutionState::Initializing | ResolutionState::Loading
        )
    }

    /// Returns true if the user has a resolved, authenticated session.
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            ResolutionState::Authenticated | ResolutionState::ForcedPasswordChange
        )
    }
}

impl From<&ResolutionMachineState> for ResolutionState {
    fn from(state: &ResolutionMachineState) -> Self {
        match state {
            ResolutionMachineState::Initializing => ResolutionState::Initializing,
            ResolutionMachineState::Loading => ResolutionState::Loading,
            ResolutionMachineState::Authenticated => ResolutionState::Authenticated,
            ResolutionMachineState::ForcedPasswordChange => ResolutionState::ForcedPasswordChange,
            ResolutionMachineState::Unauthenticated => ResolutionState::Unauthenticated,
        }
    }
}
