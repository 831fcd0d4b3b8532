//! Supabase PostgREST implementation of the profile store.

use crate::error::{ProfileStoreError, ProfileStoreResult};
use crate::{ProfileRecord, ProfileStore};
use async_trait::async_trait;
use identity_client::AccessTokenProvider;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default request timeout for profile lookups.
///
/// This bounds the HTTP call itself; UI liveness is guaranteed
/// separately by the engine's per-load safety timer.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Supabase REST client for profile point lookups.
#[derive(Clone)]
pub struct SupabaseProfileStore {
    http_client: reqwest::Client,
    api_url: String,
    publishable_key: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl SupabaseProfileStore {
    /// Create a new profile store client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `publishable_key` - The Supabase publishable API key
    /// * `tokens` - Source of the current access token for row-level security
    pub fn new(
        api_url: impl Into<String>,
        publishable_key: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self::with_request_timeout(api_url, publishable_key, tokens, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new profile store client with a custom request timeout.
    pub fn with_request_timeout(
        api_url: impl Into<String>,
        publishable_key: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
        request_timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            http_client,
            api_url: api_url.into(),
            publishable_key: publishable_key.into(),
            tokens,
        }
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }
}

#[async_trait]
impl ProfileStore for SupabaseProfileStore {
    async fn get_profile(&self, user_id: &str) -> ProfileStoreResult<Option<ProfileRecord>> {
        let access_token = self
            .tokens
            .access_token()
            .ok_or(ProfileStoreError::NoAccessToken)?;

        let url = format!(
            "{}?id=eq.{}&select=role,email,full_name&limit=1",
            self.rest_url("profiles"),
            user_id
        );

        debug!(user_id = %user_id, "Fetching profile from Supabase");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            warn!(status = %status, body_summary = %body_summary, "Failed to fetch profile");
            return Err(ProfileStoreError::Api {
                status: status.as_u16(),
                message: format!("profile fetch failed ({body_summary})"),
            });
        }

        let profiles: Vec<ProfileRecord> = response.json().await?;
        Ok(profiles.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoToken;

    impl AccessTokenProvider for NoToken {
        fn access_token(&self) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_rest_url() {
        let store = SupabaseProfileStore::new(
            "https://test.supabase.co",
            "test-key",
            Arc::new(NoToken),
        );
        assert_eq!(
            store.rest_url("profiles"),
            "https://test.supabase.co/rest/v1/profiles"
        );
    }

    #[tokio::test]
    async fn test_get_profile_without_token_fails_fast() {
        let store = SupabaseProfileStore::new(
            "https://test.supabase.co",
            "test-key",
            Arc::new(NoToken),
        );
        let result = store.get_profile("user-1").await;
        assert!(matches!(result, Err(ProfileStoreError::NoAccessToken)));
    }

    #[test]
    fn test_profile_record_deserializes_partial_rows() {
        let record: ProfileRecord =
            serde_json::from_str(r#"{"role": "store_owner"}"#).unwrap();
        assert_eq!(record.role.as_deref(), Some("store_owner"));
        assert!(record.email.is_none());
        assert!(record.full_name.is_none());
    }
}
