//! Identity lifecycle: sign-up fallback, sign-out clearing, and the
//! stale-fetch discard under a subject change.

use std::time::Duration;

use beanpass_client::StoreError;
use beanpass_integration_tests::{EMAIL, PASSWORD, TestContext};

#[tokio::test]
async fn test_sign_up_creates_profile_with_identity_token() {
    let ctx = TestContext::signed_in().await;

    let snapshot = ctx.snapshot();
    let profile = snapshot.profile.expect("profile missing after sign-up");
    assert_eq!(profile.email.as_str(), EMAIL);
    assert_eq!(profile.display_name(), "Ada Lovelace");
    assert_eq!(profile.scan_token.as_str().len(), 16);
    assert!(profile.org_id.is_none());
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_sign_up_with_registered_email_behaves_like_sign_in() {
    let ctx = TestContext::signed_in().await;
    ctx.store.sign_out().await;

    // Same email again: no error, and the snapshot ends up identical to a
    // plain sign-in, existing profile included.
    ctx.store
        .sign_up(EMAIL, PASSWORD, "Different", "Name")
        .await
        .expect("already-registered sign-up should fall back to sign-in");

    let snapshot = ctx.snapshot();
    assert!(snapshot.session.is_some());
    let profile = snapshot.profile.expect("profile missing");
    assert_eq!(profile.display_name(), "Ada Lovelace");
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_sign_up_with_registered_email_and_wrong_password_is_credentials_error() {
    let ctx = TestContext::signed_in().await;
    ctx.store.sign_out().await;

    let from_sign_up = ctx
        .store
        .sign_up(EMAIL, "not-the-password", "Ada", "Lovelace")
        .await
        .unwrap_err();
    let from_sign_in = ctx
        .store
        .sign_in(EMAIL, "not-the-password")
        .await
        .unwrap_err();

    assert!(matches!(from_sign_up, StoreError::Credentials(_)));
    assert_eq!(from_sign_up.to_string(), from_sign_in.to_string());
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_sign_out_clears_all_state() {
    let ctx = TestContext::signed_in().await;
    ctx.seed_location("Corner Roasters", "CAFE01");
    ctx.store.connect_location("CAFE01").await.unwrap();

    ctx.store.sign_out().await;

    let snapshot = ctx.snapshot();
    assert!(snapshot.session.is_none());
    assert!(snapshot.profile.is_none());
    assert!(snapshot.saved_locations.is_empty());
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_sign_out_clears_state_even_when_remote_call_fails() {
    let ctx = TestContext::signed_in().await;
    ctx.service.set_end_session_failure(true);

    ctx.store.sign_out().await;

    let snapshot = ctx.snapshot();
    assert!(snapshot.session.is_none());
    assert!(snapshot.profile.is_none());
    assert!(snapshot.saved_locations.is_empty());
    ctx.store.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_stale_fetch_for_previous_subject_is_discarded() {
    let ctx = TestContext::new().await;
    ctx.store
        .sign_up(EMAIL, PASSWORD, "Ada", "Lovelace")
        .await
        .unwrap();
    ctx.store
        .sign_up("grace@example.com", PASSWORD, "Grace", "Hopper")
        .await
        .unwrap();
    ctx.store.sign_out().await;

    // Subject A's profile fetch stalls mid-resynchronization.
    ctx.service.set_read_delay(Some(Duration::from_secs(5)));
    let store = ctx.store.clone();
    let pending = tokio::spawn(async move { store.sign_in(EMAIL, PASSWORD).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The user signs out and signs in as subject B while A's fetch is
    // still in flight.
    ctx.service.set_read_delay(None);
    ctx.store.sign_out().await;
    ctx.store.sign_in("grace@example.com", PASSWORD).await.unwrap();

    // A's fetch eventually resolves; its result must not be applied.
    pending.await.expect("sign-in task panicked").unwrap();
    let profile = ctx.snapshot().profile.expect("profile missing");
    assert_eq!(profile.email.as_str(), "grace@example.com");
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_session_recovery_on_initialize() {
    let ctx = TestContext::signed_in().await;
    ctx.store.shutdown();

    // A second store over the same service (same device, new process)
    // recovers the persisted session and loads the profile.
    let revived = beanpass_client::ClientStore::new(ctx.service.clone());
    revived.initialize().await;

    let snapshot = revived.snapshot();
    assert!(!snapshot.initializing);
    assert!(snapshot.session.is_some());
    assert!(snapshot.profile.is_some());
    revived.shutdown();
}
