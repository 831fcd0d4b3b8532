//! Shell wiring: configuration, Supabase clients, engine lifecycle.

use crate::dispatcher::TracingDispatcher;
use identity_client::{AccessTokenProvider, SupabaseIdentityClient};
use profile_store::SupabaseProfileStore;
use session_resolution_engine::{ResolutionConfig, ResolutionEngine};
use shiftwise_config_and_utils::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run the resolution engine in the foreground until Ctrl-C.
pub async fn run_shell(
    config: Config,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let identity = Arc::new(SupabaseIdentityClient::new(
        &config.supabase_url,
        &config.supabase_publishable_key,
    ));
    let tokens: Arc<dyn AccessTokenProvider> = identity.clone();
    let profiles = Arc::new(SupabaseProfileStore::new(
        &config.supabase_url,
        &config.supabase_publishable_key,
        tokens,
    ));

    let engine = ResolutionEngine::new(
        identity.clone(),
        profiles,
        resolution_config(&config),
    );
    engine.set_navigation_callback(TracingDispatcher::callback());
    engine.start();

    // A cold start has no stored session: announce it so the engine
    // settles on the auth screens without waiting for the fallback
    // timer.
    identity.announce_initial_session();

    match (email.as_deref(), password.as_deref()) {
        (Some(email), Some(password)) => {
            match identity.sign_in_with_password(email, password).await {
                Ok(session) => info!(user_id = %session.user_id, "Signed in"),
                Err(err) => warn!(error = %err, "Sign-in failed"),
            }
        }
        (Some(_), None) => warn!("--email given without a password, skipping sign-in"),
        _ => {}
    }

    info!("Shell running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    engine.shutdown().await;
    Ok(())
}

/// Validate the configuration and print the effective values.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let url = config.supabase_url()?;
    println!("supabase_url: {url}");
    println!("log_level: {}", config.log_level);
    println!(
        "resolution: per_load={}ms global={}ms fallback_check={}ms",
        config.resolution.per_load_timeout_ms,
        config.resolution.global_timeout_ms,
        config.resolution.fallback_session_check_ms
    );
    Ok(())
}

fn resolution_config(config: &Config) -> ResolutionConfig {
    ResolutionConfig {
        per_load_timeout: Duration::from_millis(config.resolution.per_load_timeout_ms),
        global_timeout: Duration::from_millis(config.resolution.global_timeout_ms),
        fallback_session_check: Duration::from_millis(config.resolution.fallback_session_check_ms),
    }
}
