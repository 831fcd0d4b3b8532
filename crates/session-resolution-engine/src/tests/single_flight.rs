//! Single-flight load deduplication.

use super::harness::{
    identity_user, profile_with_role, wait_until, ProfileReply, TestHarness, UserReply,
};
use crate::navigation::NavigationTarget;
use identity_client::AuthEventKind;
use std::time::Duration;

#[tokio::test]
async fn rapid_duplicate_sign_ins_cause_at_most_one_fetch() {
    let harness = TestHarness::new(ProfileReply::Delayed(
        Duration::from_millis(100),
        profile_with_role("store_owner", "worker@store.com"),
    ));
    harness
        .identity
        .set_user_reply(UserReply::User(identity_user(
            "user-1",
            "worker@store.com",
            false,
        )));
    harness.start();

    // The provider fires twice for one login.
    harness.emit_with_session(AuthEventKind::SignedIn, "user-1", "worker@store.com");
    harness.emit_with_session(AuthEventKind::SignedIn, "user-1", "worker@store.com");

    assert!(
        harness
            .wait_for_target(NavigationTarget::StoreOwner, Duration::from_secs(2))
            .await
    );
    assert_eq!(
        harness.profiles.fetches(),
        1,
        "the duplicate must be dropped while the first load is in flight"
    );
}

#[tokio::test]
async fn dropped_duplicate_is_never_retried_or_queued() {
    let harness = TestHarness::new(ProfileReply::Delayed(
        Duration::from_millis(100),
        profile_with_role("store_owner", "worker@store.com"),
    ));
    harness
        .identity
        .set_user_reply(UserReply::User(identity_user(
            "user-1",
            "worker@store.com",
            false,
        )));
    harness.start();

    harness.emit_with_session(AuthEventKind::SignedIn, "user-1", "worker@store.com");
    harness.emit_with_session(AuthEventKind::SignedIn, "user-1", "worker@store.com");

    assert!(
        harness
            .wait_for_target(NavigationTarget::StoreOwner, Duration::from_secs(2))
            .await
    );

    // Nothing replays the dropped request after the guard clears.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.profiles.fetches(), 1);
}

#[tokio::test]
async fn sequential_loads_are_not_deduplicated() {
    let harness = TestHarness::new(ProfileReply::Found(profile_with_role(
        "store_owner",
        "worker@store.com",
    )));
    harness
        .identity
        .set_user_reply(UserReply::User(identity_user(
            "user-1",
            "worker@store.com",
            false,
        )));
    harness.start();

    harness.emit_with_session(AuthEventKind::SignedIn, "user-1", "worker@store.com");
    assert!(
        wait_until(|| harness.profiles.fetches() == 1, Duration::from_secs(1)).await
    );
    assert!(
        harness
            .wait_for_target(NavigationTarget::StoreOwner, Duration::from_secs(2))
            .await
    );

    harness.emit_with_session(AuthEventKind::SignedIn, "user-1", "worker@store.com");
    assert!(
        wait_until(|| harness.profiles.fetches() == 2, Duration::from_secs(1)).await,
        "a load after the previous one completed must run"
    );
}
