//! Provider traits consumed by the resolution engine.

use crate::error::IdentityResult;
use crate::events::{AuthEvent, IdentityUser, Session};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Default capacity of a subscriber's event queue.
pub(crate) const EVENT_QUEUE_CAPACITY: usize = 64;

/// A live subscription to the identity provider's auth events.
///
/// Dropping the subscription unsubscribes from the provider; the
/// subscription is acquired at engine start and released at engine
/// shutdown (single-owner lifecycle).
pub struct AuthEventSubscription {
    receiver: mpsc::Receiver<AuthEvent>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl AuthEventSubscription {
    /// Build a subscription from a receiver and an unsubscribe hook.
    pub fn new(
        receiver: mpsc::Receiver<AuthEvent>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Receive the next event, or `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        self.receiver.recv().await
    }
}

impl Drop for AuthEventSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// External identity provider: the sole source of auth events, plus
/// point reads for the current session and user record.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to auth events. Events are delivered in order; the
    /// provider may emit duplicates for logically equivalent events.
    fn subscribe(&self) -> AuthEventSubscription;

    /// Fetch the current session, if any.
    async fn get_session(&self) -> IdentityResult<Option<Session>>;

    /// Fetch the provider's current user record, if signed in.
    async fn get_current_user(&self) -> IdentityResult<Option<IdentityUser>>;
}

/// Source of the current access token for data-store clients that
/// authenticate their requests with the identity provider's session.
pub trait AccessTokenProvider: Send + Sync {
    /// The current access token, or `None` when not signed in.
    fn access_token(&self) -> Option<String>;
}
