//! Test harness for resolution engine integration tests.
//!
//! Provides:
//! - MockIdentityProvider: scriptable event source and user/session reads
//! - MockProfileStore: scriptable profile lookups with delay/hang modes
//! - TestHarness: wires both mocks into a ResolutionEngine

use crate::engine::{ResolutionConfig, ResolutionEngine};
use crate::navigation::NavigationTarget;
use async_trait::async_trait;
use identity_client::{
    AuthEvent, AuthEventKind, AuthEventSubscription, IdentityError, IdentityProvider,
    IdentityResult, IdentityUser, Session, UserMetadata,
};
use profile_store::{ProfileRecord, ProfileStore, ProfileStoreError, ProfileStoreResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Scripted reply for `get_current_user`.
#[derive(Debug, Clone)]
pub enum UserReply {
    /// Return this user.
    User(IdentityUser),
    /// Return no user (signed out).
    SignedOut,
    /// Fail with a server error.
    Error,
    /// Never respond (for timeout testing).
    Never,
}

/// Scripted reply for `get_session`.
#[derive(Debug, Clone)]
pub enum SessionReply {
    /// Return this session.
    Session(Session),
    /// Return no session.
    None,
    /// Fail with a server error.
    Error,
}

/// Mock identity provider with scriptable reads and manual event emission.
pub struct MockIdentityProvider {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<AuthEvent>>>,
    next_subscriber_id: AtomicU64,
    user_reply: Mutex<UserReply>,
    session_reply: Mutex<SessionReply>,
    user_fetches: AtomicUsize,
    session_fetches: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(0),
            user_reply: Mutex::new(UserReply::SignedOut),
            session_reply: Mutex::new(SessionReply::None),
            user_fetches: AtomicUsize::new(0),
            session_fetches: AtomicUsize::new(0),
        }
    }

    /// Script the reply for subsequent `get_current_user` calls.
    pub fn set_user_reply(&self, reply: UserReply) {
        *self.user_reply.lock().unwrap() = reply;
    }

    /// Script the reply for subsequent `get_session` calls.
    pub fn set_session_reply(&self, reply: SessionReply) {
        *self.session_reply.lock().unwrap() = reply;
    }

    /// Deliver an event to all live subscriptions.
    pub fn emit(&self, event: AuthEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|_, sender| sender.try_send(event.clone()).is_ok());
    }

    /// Number of `get_session` calls observed.
    pub fn session_fetches(&self) -> usize {
        self.session_fetches.load(Ordering::SeqCst)
    }

    /// Number of `get_current_user` calls observed.
    pub fn user_fetches(&self) -> usize {
        self.user_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn subscribe(&self) -> AuthEventSubscription {
        let (tx, rx) = mpsc::channel(64);
        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().unwrap().insert(id, tx);
        AuthEventSubscription::new(rx, || {})
    }

    async fn get_session(&self) -> IdentityResult<Option<Session>> {
        self.session_fetches.fetch_add(1, Ordering::SeqCst);
        let reply = self.session_reply.lock().unwrap().clone();
        match reply {
            SessionReply::Session(session) => Ok(Some(session)),
            SessionReply::None => Ok(None),
            SessionReply::Error => Err(IdentityError::AuthApi {
                status: 500,
                message: "mock session failure".to_string(),
            }),
        }
    }

    async fn get_current_user(&self) -> IdentityResult<Option<IdentityUser>> {
        self.user_fetches.fetch_add(1, Ordering::SeqCst);
        let reply = self.user_reply.lock().unwrap().clone();
        match reply {
            UserReply::User(user) => Ok(Some(user)),
            UserReply::SignedOut => Ok(None),
            UserReply::Error => Err(IdentityError::AuthApi {
                status: 500,
                message: "mock user failure".to_string(),
            }),
            UserReply::Never => std::future::pending().await,
        }
    }
}

/// Scripted reply for `get_profile`.
#[derive(Debug, Clone)]
pub enum ProfileReply {
    /// Return this record.
    Found(ProfileRecord),
    /// Return no record.
    NotFound,
    /// Fail with a server error.
    Error,
    /// Delay before returning this record.
    Delayed(Duration, ProfileRecord),
    /// Never respond (for timeout testing).
    Never,
}

/// Mock profile store with scriptable lookups and a fetch counter.
pub struct MockProfileStore {
    reply: Mutex<ProfileReply>,
    fetches: AtomicUsize,
}

impl MockProfileStore {
    pub fn new(reply: ProfileReply) -> Self {
        Self {
            reply: Mutex::new(reply),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Script the reply for subsequent `get_profile` calls.
    pub fn set_reply(&self, reply: ProfileReply) {
        *self.reply.lock().unwrap() = reply;
    }

    /// Number of profile fetches initiated.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn get_profile(&self, _user_id: &str) -> ProfileStoreResult<Option<ProfileRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            ProfileReply::Found(record) => Ok(Some(record)),
            ProfileReply::NotFound => Ok(None),
            ProfileReply::Error => Err(ProfileStoreError::Api {
                status: 500,
                message: "mock profile failure".to_string(),
            }),
            ProfileReply::Delayed(delay, record) => {
                tokio::time::sleep(delay).await;
                Ok(Some(record))
            }
            ProfileReply::Never => std::future::pending().await,
        }
    }
}

/// Orchestrates the engine and both mocks.
pub struct TestHarness {
    pub identity: Arc<MockIdentityProvider>,
    pub profiles: Arc<MockProfileStore>,
    pub engine: ResolutionEngine,
}

impl TestHarness {
    /// Harness with non-interfering timers: only the behavior under
    /// test should be able to fire them.
    pub fn new(profile_reply: ProfileReply) -> Self {
        Self::with_config(profile_reply, quiet_config())
    }

    pub fn with_config(profile_reply: ProfileReply, config: ResolutionConfig) -> Self {
        let identity = Arc::new(MockIdentityProvider::new());
        let profiles = Arc::new(MockProfileStore::new(profile_reply));
        let engine = ResolutionEngine::new(identity.clone(), profiles.clone(), config);
        Self {
            identity,
            profiles,
            engine,
        }
    }

    pub fn start(&self) {
        self.engine.start();
    }

    /// Emit a triggering event carrying a session for `user_id`.
    pub fn emit_with_session(&self, kind: AuthEventKind, user_id: &str, email: &str) {
        self.identity
            .emit(AuthEvent::new(kind, Some(session(user_id, email))));
    }

    /// Wait until the engine settles on `target` with loading cleared.
    pub async fn wait_for_target(&self, target: NavigationTarget, timeout: Duration) -> bool {
        wait_until(
            || {
                let snapshot = self.engine.snapshot();
                !snapshot.is_loading && snapshot.navigation_target == target
            },
            timeout,
        )
        .await
    }
}

/// Timers large enough that they cannot fire during a test unless the
/// test configures them down.
pub fn quiet_config() -> ResolutionConfig {
    ResolutionConfig {
        per_load_timeout: Duration::from_secs(10),
        global_timeout: Duration::from_secs(10),
        fallback_session_check: Duration::from_secs(10),
    }
}

/// Poll a predicate every few milliseconds until it holds or the
/// timeout elapses.
pub async fn wait_until(predicate: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Session payload for a triggering event.
pub fn session(user_id: &str, email: &str) -> Session {
    Session {
        user_id: user_id.to_string(),
        email: email.to_string(),
    }
}

/// Identity user with the given email and password-change flag.
pub fn identity_user(user_id: &str, email: &str, must_change_password: bool) -> IdentityUser {
    IdentityUser {
        id: user_id.to_string(),
        email: Some(email.to_string()),
        metadata: UserMetadata {
            must_change_password,
        },
    }
}

/// Profile record with the given role.
pub fn profile_with_role(role: &str, email: &str) -> ProfileRecord {
    ProfileRecord {
        role: Some(role.to_string()),
        email: Some(email.to_string()),
        full_name: Some("Test Worker".to_string()),
    }
}
