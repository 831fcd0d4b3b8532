//! Timeout supervision for the resolution engine.
//!
//! Owns three independently-armed, independently-cancellable one-shot
//! timers. No code path may leave the UI permanently loading, so every
//! timer expiry path ends in a forced transition; completed loads cancel
//! their timer before it fires.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Which timer a call refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    PerLoad,
    Global,
    FallbackSessionCheck,
}

/// Supervisor for the engine's three safety timers.
///
/// Each timer fires at most once. Arming a timer that is already armed
/// replaces (aborts) the previous one; all timers are cancelled on
/// engine shutdown.
pub struct TimeoutSupervisor {
    per_load: Mutex<Option<JoinHandle<()>>>,
    global: Mutex<Option<JoinHandle<()>>>,
    fallback: Mutex<Option<JoinHandle<()>>>,
}

impl TimeoutSupervisor {
    /// Create a supervisor with no timers armed.
    pub fn new() -> Self {
        Self {
            per_load: Mutex::new(None),
            global: Mutex::new(None),
            fallback: Mutex::new(None),
        }
    }

    /// Arm the per-load safety timer.
    ///
    /// Cancelled by the loader when the load completes (success or
    /// error) before expiry.
    pub fn arm_per_load(
        &self,
        delay: Duration,
        on_expiry: impl Future<Output = ()> + Send + 'static,
    ) {
        self.arm(TimerKind::PerLoad, &self.per_load, delay, on_expiry);
    }

    /// Cancel the per-load safety timer if it has not already fired.
    pub fn cancel_per_load(&self) {
        Self::cancel(TimerKind::PerLoad, &self.per_load);
    }

    /// Arm the global safety timer (once, at engine start).
    pub fn arm_global(
        &self,
        delay: Duration,
        on_expiry: impl Future<Output = ()> + Send + 'static,
    ) {
        self.arm(TimerKind::Global, &self.global, delay, on_expiry);
    }

    /// Arm the fallback session check timer (once, at engine start).
    pub fn arm_fallback_session_check(
        &self,
        delay: Duration,
        on_expiry: impl Future<Output = ()> + Send + 'static,
    ) {
        self.arm(
            TimerKind::FallbackSessionCheck,
            &self.fallback,
            delay,
            on_expiry,
        );
    }

    /// Cancel every armed timer. Called on engine shutdown.
    pub fn cancel_all(&self) {
        Self::cancel(TimerKind::PerLoad, &self.per_load);
        Self::cancel(TimerKind::Global, &self.global);
        Self::cancel(TimerKind::FallbackSessionCheck, &self.fallback);
    }

    fn arm(
        &self,
        kind: TimerKind,
        slot: &Mutex<Option<JoinHandle<()>>>,
        delay: Duration,
        on_expiry: impl Future<Output = ()> + Send + 'static,
    ) {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_expiry.await;
        });

        let mut guard = slot.lock().unwrap();
        if let Some(previous) = guard.replace(handle) {
            debug!(?kind, "Re-arming timer, aborting previous");
            previous.abort();
        }
    }

    fn cancel(kind: TimerKind, slot: &Mutex<Option<JoinHandle<()>>>) {
        if let Some(handle) = slot.lock().unwrap().take() {
            debug!(?kind, "Cancelling timer");
            handle.abort();
        }
    }
}

impl Default for TimeoutSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
