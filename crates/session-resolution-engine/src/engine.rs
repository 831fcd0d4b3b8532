//! The resolution engine runtime.
//!
//! Consumes identity-provider events plus loader results, maintains
//! resolution state, and emits a navigation snapshot to the
//! presentation layer. The engine's public surface has no
//! error-returning calls: every failure is logged and becomes a state
//! transition.

use crate::loader::{resolve_outcome, LoadOutcome};
use crate::navigation::navigation_target;
use crate::resolution_fsm::{ResolutionInput, ResolutionMachine, ResolutionState};
use crate::timers::TimeoutSupervisor;
use crate::types::{NavigationCallback, ResolutionSnapshot, ResolvedIdentity};
use identity_client::{AuthEvent, AuthEventKind, IdentityProvider, Session};
use profile_store::ProfileStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Timing configuration for the resolution engine.
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// Safety timeout for a single profile load.
    pub per_load_timeout: Duration,
    /// Hard upper bound on time-to-first-screen.
    pub global_timeout: Duration,
    /// Delay before manually fetching the session when the provider has
    /// not announced the initial session on its own.
    pub fallback_session_check: Duration,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            per_load_timeout: Duration::from_millis(5_000),
            global_timeout: Duration::from_millis(6_000),
            fallback_session_check: Duration::from_millis(1_500),
        }
    }
}

/// Session/role resolution engine.
///
/// Create with [`ResolutionEngine::new`], then call
/// [`start`](ResolutionEngine::start) to acquire the identity-provider
/// subscription and begin resolving. [`shutdown`](ResolutionEngine::shutdown)
/// releases the subscription and cancels all timers.
pub struct ResolutionEngine {
    shared: EngineShared,
    stop_tx: broadcast::Sender<()>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

/// Cheap-clone handle to the engine state, shared with spawned tasks.
#[derive(Clone)]
struct EngineShared {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    config: ResolutionConfig,
    fsm: Mutex<ResolutionMachine>,
    resolved: Mutex<Option<ResolvedIdentity>>,
    /// Single-flight guard: true while a profile load is in flight.
    load_in_flight: Mutex<bool>,
    /// Set once the first initial-session signal has been processed.
    initial_load_done: AtomicBool,
    /// Bumped on sign-out so results of in-flight loads for the
    /// previous session are discarded on arrival.
    auth_epoch: AtomicU64,
    timers: TimeoutSupervisor,
    callback: Mutex<Option<NavigationCallback>>,
}

impl ResolutionEngine {
    /// Create a new engine. No subscription is acquired until `start`.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        config: ResolutionConfig,
    ) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            shared: EngineShared {
                inner: Arc::new(EngineInner {
                    identity,
                    profiles,
                    config,
                    fsm: Mutex::new(ResolutionMachine::new()),
                    resolved: Mutex::new(None),
                    load_in_flight: Mutex::new(false),
                    initial_load_done: AtomicBool::new(false),
                    auth_epoch: AtomicU64::new(0),
                    timers: TimeoutSupervisor::new(),
                    callback: Mutex::new(None),
                }),
            },
            stop_tx,
            pump: Mutex::new(None),
        }
    }

    /// Set a callback to be notified with a fresh snapshot on every
    /// state transition.
    pub fn set_navigation_callback(&self, callback: NavigationCallback) {
        let mut cb = self.shared.inner.callback.lock().unwrap();
        *cb = Some(callback);
    }

    /// Current resolution state.
    pub fn state(&self) -> ResolutionState {
        self.shared.state()
    }

    /// Current navigation snapshot.
    pub fn snapshot(&self) -> ResolutionSnapshot {
        self.shared.snapshot()
    }

    /// Acquire the identity-provider subscription, arm the global and
    /// fallback timers, and start pumping events.
    pub fn start(&self) {
        let mut subscription = self.shared.inner.identity.subscribe();
        let mut stop_rx = self.stop_tx.subscribe();
        let engine = self.shared.clone();

        // Process start always begins a resolution cycle.
        engine.transition(&ResolutionInput::EngineStarted);

        // Hard upper bound on time-to-first-screen; takes precedence
        // over all other logic.
        let on_global_timeout = {
            let engine = engine.clone();
            async move {
                engine.force_out_of_loading("global timeout");
            }
        };
        engine
            .inner
            .timers
            .arm_global(engine.inner.config.global_timeout, on_global_timeout);

        let on_fallback_check = {
            let engine = engine.clone();
            async move {
                engine.run_fallback_session_check().await;
            }
        };
        engine.inner.timers.arm_fallback_session_check(
            engine.inner.config.fallback_session_check,
            on_fallback_check,
        );

        info!("Resolution engine started");

        let pump = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    event = subscription.recv() => match event {
                        Some(event) => engine.handle_auth_event(event),
                        None => {
                            debug!("Identity provider closed the event stream");
                            break;
                        }
                    }
                }
            }
            // The subscription drops here, releasing it at the provider.
        });
        *self.pump.lock().unwrap() = Some(pump);
    }

    /// Stop the event pump, release the subscription, and cancel all
    /// timers.
    pub async fn shutdown(&self) {
        let _ = self.stop_tx.send(());
        let pump = self.pump.lock().unwrap().take();
        if let Some(pump) = pump {
            let _ = pump.await;
        }
        self.shared.inner.timers.cancel_all();
        info!("Resolution engine stopped");
    }
}

impl EngineShared {
    /// Handle one identity-provider event.
    ///
    /// Must stay synchronous: the provider's delivery is blocked while
    /// this runs, so fetches are handed off to spawned tasks and never
    /// performed inline.
    fn handle_auth_event(&self, event: AuthEvent) {
        debug!(kind = ?event.kind, has_session = event.session.is_some(), "Auth event");
        match event.kind {
            AuthEventKind::SignedOut => self.handle_signed_out(),
            AuthEventKind::TokenRefreshed => {
                // Explicitly ignored: a refreshed token never changes
                // who the user is.
                debug!("Token refresh does not trigger a profile reload");
            }
            AuthEventKind::InitialSession => self.handle_initial_session(event.session),
            AuthEventKind::SignedIn
            | AuthEventKind::UserUpdated
            | AuthEventKind::PasswordRecovery => match event.session {
                Some(session) => self.begin_load(session),
                None => debug!(kind = ?event.kind, "Event carried no session, nothing to resolve"),
            },
        }
    }

    fn handle_signed_out(&self) {
        // Any in-flight load now belongs to the previous session; its
        // eventual result is discarded on arrival.
        self.inner.auth_epoch.fetch_add(1, Ordering::SeqCst);
        *self.inner.resolved.lock().unwrap() = None;
        info!("Signed out");
        self.transition(&ResolutionInput::SignedOut);
    }

    fn handle_initial_session(&self, session: Option<Session>) {
        if self.inner.initial_load_done.swap(true, Ordering::SeqCst) {
            debug!("Initial session already processed, ignoring");
            return;
        }

        match session {
            Some(session) => {
                info!(user_id = %session.user_id, "Initial session present");
                self.begin_load(session);
            }
            None => {
                info!("No initial session, resolving unauthenticated");
                self.transition(&ResolutionInput::NoInitialSession);
            }
        }
    }

    fn begin_load(&self, session: Session) {
        if session.user_id.is_empty() {
            warn!("Triggering event carried an empty user id, ignoring");
            return;
        }

        self.transition(&ResolutionInput::BeginLoad);

        let epoch = self.inner.auth_epoch.load(Ordering::SeqCst);
        let engine = self.clone();
        // Deferred hand-off: the load runs on its own task, outside the
        // event source's callback stack.
        tokio::spawn(async move {
            engine.run_profile_load(session.user_id, epoch).await;
        });
    }

    async fn run_profile_load(&self, user_id: String, epoch: u64) {
        // Single-flight: a second request while one is in flight is
        // dropped, not queued or retried.
        {
            let mut in_flight = self.inner.load_in_flight.lock().unwrap();
            if *in_flight {
                info!(user_id = %user_id, "Profile load already in flight, dropping request");
                return;
            }
            *in_flight = true;
        }

        let on_per_load_timeout = {
            let engine = self.clone();
            async move {
                engine.on_per_load_timeout();
            }
        };
        self.inner
            .timers
            .arm_per_load(self.inner.config.per_load_timeout, on_per_load_timeout);

        debug!(user_id = %user_id, "Loading profile");
        let (profile, user) = tokio::join!(
            self.inner.profiles.get_profile(&user_id),
            self.inner.identity.get_current_user(),
        );

        let outcome = resolve_outcome(&user_id, profile, user);

        self.inner.timers.cancel_per_load();
        *self.inner.load_in_flight.lock().unwrap() = false;

        self.apply_load_outcome(epoch, outcome);
    }

    fn apply_load_outcome(&self, epoch: u64, outcome: LoadOutcome) {
        if self.inner.auth_epoch.load(Ordering::SeqCst) != epoch {
            info!("Discarding resolution result from a previous session");
            return;
        }

        match outcome {
            LoadOutcome::Resolved(identity) => {
                let input = if identity.must_change_password {
                    ResolutionInput::ResolvedPasswordChange
                } else {
                    ResolutionInput::ResolvedOk
                };
                info!(
                    user_id = %identity.user_id,
                    role = %identity.role,
                    must_change_password = identity.must_change_password,
                    "Identity resolved"
                );
                *self.inner.resolved.lock().unwrap() = Some(identity);
                self.transition(&input);
            }
            LoadOutcome::Unauthenticated => {
                warn!("Resolution failed entirely, treating as signed out");
                *self.inner.resolved.lock().unwrap() = None;
                self.transition(&ResolutionInput::ResolutionFailed);
            }
        }
    }

    fn on_per_load_timeout(&self) {
        warn!("Profile load exceeded its safety timeout");
        *self.inner.load_in_flight.lock().unwrap() = false;
        self.force_out_of_loading("per-load timeout");
    }

    /// Force the engine out of a loading state without re-deriving the
    /// role: whatever was last resolved decides the post-timeout state.
    fn force_out_of_loading(&self, reason: &str) {
        if !self.state().is_loading() {
            return;
        }

        let input = match self.inner.resolved.lock().unwrap().as_ref() {
            Some(identity) if identity.must_change_password => {
                ResolutionInput::TimeoutPasswordChange
            }
            Some(_) => ResolutionInput::TimeoutAuthenticated,
            None => ResolutionInput::TimeoutUnauthenticated,
        };
        warn!(reason, "Forcing resolution out of loading state");
        self.transition(&input);
    }

    async fn run_fallback_session_check(&self) {
        if self.inner.initial_load_done.load(Ordering::SeqCst) {
            debug!("Initial session already handled, skipping fallback check");
            return;
        }

        info!("No initial session observed yet, fetching session manually");
        let session = match self.inner.identity.get_session().await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "Fallback session fetch failed");
                None
            }
        };

        self.handle_auth_event(AuthEvent::new(AuthEventKind::InitialSession, session));
    }

    /// Apply an FSM input, ignoring inputs with no effect in the
    /// current state (idempotence under duplicate events).
    fn transition(&self, input: &ResolutionInput) {
        let mut fsm = self.inner.fsm.lock().unwrap();
        let old_state = ResolutionState::from(fsm.state());

        if fsm.consume(input).is_err() {
            debug!(?input, state = ?old_state, "Input has no effect in current state, ignoring");
            return;
        }

        let new_state = ResolutionState::from(fsm.state());
        drop(fsm);

        if old_state != new_state {
            debug!(
                old_state = ?old_state,
                new_state = ?new_state,
                "Resolution state transition"
            );
            self.notify(new_state);
        }
    }

    fn notify(&self, state: ResolutionState) {
        let snapshot = self.snapshot_for(state);
        let cb = self.inner.callback.lock().unwrap();
        if let Some(callback) = cb.as_ref() {
            callback(snapshot);
        }
    }

    fn state(&self) -> ResolutionState {
        ResolutionState::from(self.inner.fsm.lock().unwrap().state())
    }

    fn snapshot(&self) -> ResolutionSnapshot {
        self.snapshot_for(self.state())
    }

    fn snapshot_for(&self, state: ResolutionState) -> ResolutionSnapshot {
        let resolved = self.inner.resolved.lock().unwrap().clone();
        ResolutionSnapshot {
            is_loading: state.is_loading(),
            navigation_target: navigation_target(state, resolved.as_ref()),
            resolved_user_id: resolved.map(|identity| identity.user_id),
        }
    }
}
