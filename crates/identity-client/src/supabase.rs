//! Supabase GoTrue client with in-process auth event fan-out.
//!
//! Implements `IdentityProvider` on top of the GoTrue REST API:
//! password and refresh-token grants, sign-out, and the current-user
//! endpoint. Auth events are broadcast to all live subscriptions.

use crate::error::{IdentityError, IdentityResult};
use crate::events::{AuthEvent, AuthEventKind, IdentityUser, Session, UserMetadata};
use crate::provider::{
    AccessTokenProvider, AuthEventSubscription, IdentityProvider, EVENT_QUEUE_CAPACITY,
};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// A stored GoTrue session (tokens plus decoded user identity).
#[derive(Debug, Clone)]
pub struct SupabaseSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub email: Option<String>,
}

/// Supabase password grant request.
#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Supabase token refresh request.
#[derive(Debug, Serialize)]
struct RefreshGrantRequest<'a> {
    refresh_token: &'a str,
}

/// Supabase token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadataPayload,
}

/// Supabase user verification response.
#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadataPayload,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadataPayload {
    #[serde(default)]
    must_change_password: bool,
}

impl From<UserMetadataPayload> for UserMetadata {
    fn from(payload: UserMetadataPayload) -> Self {
        UserMetadata {
            must_change_password: payload.must_change_password,
        }
    }
}

/// Claims decoded from a GoTrue access token (no signature verification;
/// the token is only trusted as far as the provider that issued it).
#[derive(Debug, Deserialize)]
struct JwtClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    exp: i64,
}

/// Supabase GoTrue client for session management and event fan-out.
#[derive(Clone)]
pub struct SupabaseIdentityClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    api_url: String,
    publishable_key: String,
    session: Mutex<Option<SupabaseSession>>,
    subscribers: Mutex<HashMap<u64, mpsc::Sender<AuthEvent>>>,
    next_subscriber_id: AtomicU64,
}

impl SupabaseIdentityClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `publishable_key` - The Supabase publishable API key
    pub fn new(api_url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http_client: reqwest::Client::new(),
                api_url: api_url.into(),
                publishable_key: publishable_key.into(),
                session: Mutex::new(None),
                subscribers: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(0),
            }),
        }
    }

    /// Build the GoTrue URL for an auth endpoint.
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.inner.api_url, path)
    }

    /// The current stored session, if any.
    pub fn current_session(&self) -> Option<SupabaseSession> {
        self.inner.session.lock().unwrap().clone()
    }

    /// Restore a session from previously issued tokens.
    ///
    /// Decodes the user identity from the access token's claims. Emits no
    /// event; call `announce_initial_session` once wiring is complete so
    /// consumers observe the restored session as an `InitialSession`.
    pub fn restore_session(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> IdentityResult<Session> {
        let access_token = access_token.into();
        let claims = decode_jwt_claims(&access_token)?;

        let session = SupabaseSession {
            access_token,
            refresh_token: refresh_token.into(),
            expires_at: DateTime::<Utc>::from_timestamp(claims.exp, 0)
                .unwrap_or_else(Utc::now),
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
        };
        *self.inner.session.lock().unwrap() = Some(session);

        Ok(Session {
            user_id: claims.sub,
            email: claims.email.unwrap_or_default(),
        })
    }

    /// Sign in with email and password. Emits `SignedIn` on success.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> IdentityResult<Session> {
        let url = format!("{}?grant_type=password", self.auth_url("token"));
        let body = PasswordGrantRequest { email, password };

        debug!("Signing in with password grant");
        let response = self
            .inner
            .http_client
            .post(&url)
            .header("apikey", &self.inner.publishable_key)
            .json(&body)
            .send()
            .await?;

        let token = self.read_token_response(response, "password grant").await?;
        let session = self.store_token_response(token);

        self.emit(AuthEvent::new(AuthEventKind::SignedIn, Some(session.clone())));
        Ok(session)
    }

    /// Refresh the current session. Emits `TokenRefreshed` on success.
    pub async fn refresh_session(&self) -> IdentityResult<Session> {
        let refresh_token = self
            .current_session()
            .map(|s| s.refresh_token)
            .ok_or(IdentityError::NotSignedIn)?;

        let url = format!("{}?grant_type=refresh_token", self.auth_url("token"));
        let body = RefreshGrantRequest {
            refresh_token: &refresh_token,
        };

        debug!("Refreshing session");
        let response = self
            .inner
            .http_client
            .post(&url)
            .header("apikey", &self.inner.publishable_key)
            .json(&body)
            .send()
            .await?;

        let token = self.read_token_response(response, "token refresh").await?;
        let session = self.store_token_response(token);

        self.emit(AuthEvent::new(
            AuthEventKind::TokenRefreshed,
            Some(session.clone()),
        ));
        Ok(session)
    }

    /// Sign out. Clears the stored session and emits `SignedOut`.
    ///
    /// A failed revocation call is logged and not surfaced: the local
    /// session is cleared either way.
    pub async fn sign_out(&self) {
        let access_token = self.inner.session.lock().unwrap().take().map(|s| s.access_token);

        if let Some(access_token) = access_token {
            let url = self.auth_url("logout");
            let result = self
                .inner
                .http_client
                .post(&url)
                .header("apikey", &self.inner.publishable_key)
                .bearer_auth(&access_token)
                .send()
                .await;
            if let Err(err) = result {
                warn!(error = %err, "Sign-out revocation request failed");
            }
        }

        self.emit(AuthEvent::new(AuthEventKind::SignedOut, None));
    }

    /// Announce the current stored session as an `InitialSession` event.
    ///
    /// Providers deliver this once after the subscription is established;
    /// the payload is `None` when no session is stored.
    pub fn announce_initial_session(&self) {
        let session = self.current_session().map(|s| Session {
            user_id: s.user_id,
            email: s.email.unwrap_or_default(),
        });
        self.emit(AuthEvent::new(AuthEventKind::InitialSession, session));
    }

    /// Broadcast an event to all live subscribers.
    ///
    /// A subscriber with a full queue loses the event (logged); closed
    /// subscribers are removed.
    pub fn emit(&self, event: AuthEvent) {
        let mut subscribers = self.inner.subscribers.lock().unwrap();
        subscribers.retain(|id, sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(subscriber = *id, kind = ?event.kind, "Auth event queue full, dropping event");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    async fn read_token_response(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> IdentityResult<TokenResponse> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "GoTrue {context} failed");
            return Err(IdentityError::AuthApi {
                status: status.as_u16(),
                message: format!("{context} failed ({body_summary})"),
            });
        }
        Ok(response.json().await?)
    }

    fn store_token_response(&self, token: TokenResponse) -> Session {
        let session = SupabaseSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            user_id: token.user.id.clone(),
            email: token.user.email.clone(),
        };
        *self.inner.session.lock().unwrap() = Some(session);

        Session {
            user_id: token.user.id,
            email: token.user.email.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityClient {
    fn subscribe(&self) -> AuthEventSubscription {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers.lock().unwrap().insert(id, tx);

        let inner = self.inner.clone();
        AuthEventSubscription::new(rx, move || {
            inner.subscribers.lock().unwrap().remove(&id);
            debug!(subscriber = id, "Auth event subscription released");
        })
    }

    async fn get_session(&self) -> IdentityResult<Option<Session>> {
        Ok(self.current_session().map(|s| Session {
            user_id: s.user_id,
            email: s.email.unwrap_or_default(),
        }))
    }

    async fn get_current_user(&self) -> IdentityResult<Option<IdentityUser>> {
        let access_token = match self.access_token() {
            Some(token) => token,
            None => return Ok(None),
        };

        let url = self.auth_url("user");
        let response = self
            .inner
            .http_client
            .get(&url)
            .header("apikey", &self.inner.publishable_key)
            .bearer_auth(&access_token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!("Current-user fetch returned 401, treating as signed out");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "Failed to fetch current user");
            return Err(IdentityError::AuthApi {
                status: status.as_u16(),
                message: format!("current-user fetch failed ({body_summary})"),
            });
        }

        let user: UserResponse = response.json().await?;
        Ok(Some(IdentityUser {
            id: user.id,
            email: user.email,
            metadata: user.user_metadata.into(),
        }))
    }
}

impl AccessTokenProvider for SupabaseIdentityClient {
    fn access_token(&self) -> Option<String> {
        self.inner
            .session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.access_token.clone())
    }
}

/// Decode the claims segment of a JWT without verifying the signature.
fn decode_jwt_claims(token: &str) -> IdentityResult<JwtClaims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            return Err(IdentityError::InvalidToken(
                "expected three JWT segments".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|err| IdentityError::InvalidToken(format!("base64 decode failed: {err}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|err| IdentityError::InvalidToken(format!("invalid claims payload: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_jwt(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_auth_url() {
        let client = SupabaseIdentityClient::new("https://test.supabase.co", "test-key");
        assert_eq!(
            client.auth_url("token"),
            "https://test.supabase.co/auth/v1/token"
        );
        assert_eq!(
            client.auth_url("user"),
            "https://test.supabase.co/auth/v1/user"
        );
    }

    #[test]
    fn test_decode_jwt_claims() {
        let token = make_jwt(&serde_json::json!({
            "sub": "user-123",
            "email": "worker@store.com",
            "exp": 1_900_000_000i64,
        }));

        let claims = decode_jwt_claims(&token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email.as_deref(), Some("worker@store.com"));
        assert_eq!(claims.exp, 1_900_000_000);
    }

    #[test]
    fn test_decode_jwt_rejects_malformed_token() {
        assert!(decode_jwt_claims("not-a-jwt").is_err());
        assert!(decode_jwt_claims("a.b").is_err());
        assert!(decode_jwt_claims("a.!!!.c").is_err());
    }

    #[test]
    fn test_restore_session_stores_identity() {
        let client = SupabaseIdentityClient::new("https://test.supabase.co", "test-key");
        let token = make_jwt(&serde_json::json!({
            "sub": "user-42",
            "email": "hr@store.com",
            "exp": 1_900_000_000i64,
        }));

        let session = client.restore_session(token, "refresh-token").unwrap();
        assert_eq!(session.user_id, "user-42");
        assert_eq!(session.email, "hr@store.com");

        let stored = client.current_session().unwrap();
        assert_eq!(stored.user_id, "user-42");
        assert_eq!(stored.refresh_token, "refresh-token");
    }

    #[tokio::test]
    async fn test_emit_fans_out_to_subscribers() {
        let client = SupabaseIdentityClient::new("https://test.supabase.co", "test-key");
        let mut first = client.subscribe();
        let mut second = client.subscribe();

        client.emit(AuthEvent::new(AuthEventKind::SignedOut, None));

        assert_eq!(
            first.recv().await.unwrap().kind,
            AuthEventKind::SignedOut
        );
        assert_eq!(
            second.recv().await.unwrap().kind,
            AuthEventKind::SignedOut
        );
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_removed_from_fanout() {
        let client = SupabaseIdentityClient::new("https://test.supabase.co", "test-key");
        let first = client.subscribe();
        let mut second = client.subscribe();
        drop(first);

        client.emit(AuthEvent::new(AuthEventKind::SignedOut, None));
        assert_eq!(
            second.recv().await.unwrap().kind,
            AuthEventKind::SignedOut
        );
        assert_eq!(client.inner.subscribers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_announce_initial_session_without_session() {
        let client = SupabaseIdentityClient::new("https://test.supabase.co", "test-key");
        let mut subscription = client.subscribe();

        client.announce_initial_session();

        let event = subscription.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::InitialSession);
        assert!(event.session.is_none());
    }
}
