//! Saved-location behavior: idempotent join, first-location-is-home, and
//! home reassignment.

use beanpass_client::StoreError;
use beanpass_integration_tests::TestContext;

#[tokio::test]
async fn test_connect_twice_creates_exactly_one_row() {
    let ctx = TestContext::signed_in().await;
    ctx.seed_location("Corner Roasters", "CAFE01");

    let first = ctx.store.connect_location("CAFE01").await.unwrap();
    let second = ctx.store.connect_location("CAFE01").await.unwrap();

    assert_eq!(first, "Corner Roasters");
    assert_eq!(second, "Corner Roasters");

    let profile = ctx.snapshot().profile.expect("profile missing");
    assert_eq!(ctx.service.customer_location_count(profile.id), 1);
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_first_location_becomes_home_and_stamps_org() {
    let ctx = TestContext::signed_in().await;
    let first = ctx.seed_location("Corner Roasters", "CAFE01");
    let second = ctx.seed_location("Harbor Beans", "CAFE02");

    ctx.store.connect_location("CAFE01").await.unwrap();

    let snapshot = ctx.snapshot();
    let home = snapshot.home_location().expect("no home location");
    assert_eq!(home.location_id, first.id);
    let profile = snapshot.profile.expect("profile missing");
    assert_eq!(profile.org_id, Some(first.org_id));

    // The second connection neither becomes home nor re-stamps the
    // organization.
    ctx.store.connect_location("CAFE02").await.unwrap();

    let snapshot = ctx.snapshot();
    assert_eq!(snapshot.saved_locations.len(), 2);
    let link = snapshot
        .saved_locations
        .iter()
        .find(|row| row.location_id == second.id)
        .expect("second link missing");
    assert!(!link.is_home);
    let profile = snapshot.profile.expect("profile missing");
    assert_eq!(profile.org_id, Some(first.org_id));
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_home_reassignment_keeps_exactly_one_home() {
    let ctx = TestContext::signed_in().await;
    ctx.seed_location("Corner Roasters", "CAFE01");
    let second = ctx.seed_location("Harbor Beans", "CAFE02");
    let third = ctx.seed_location("Summit Coffee", "CAFE03");
    ctx.store.connect_location("CAFE01").await.unwrap();
    ctx.store.connect_location("CAFE02").await.unwrap();
    ctx.store.connect_location("CAFE03").await.unwrap();

    let link_for = |location_id| {
        ctx.snapshot()
            .saved_locations
            .iter()
            .find(|row| row.location_id == location_id)
            .map(|row| row.id)
            .expect("link missing")
    };

    ctx.store.set_home_location(link_for(second.id)).await.unwrap();
    ctx.store.set_home_location(link_for(third.id)).await.unwrap();

    let snapshot = ctx.snapshot();
    let homes: Vec<_> = snapshot
        .saved_locations
        .iter()
        .filter(|row| row.is_home)
        .collect();
    assert_eq!(homes.len(), 1);
    assert_eq!(homes[0].location_id, third.id);
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_home_location_sorts_first() {
    let ctx = TestContext::signed_in().await;
    ctx.seed_location("Corner Roasters", "CAFE01");
    let second = ctx.seed_location("Harbor Beans", "CAFE02");
    ctx.store.connect_location("CAFE01").await.unwrap();
    ctx.store.connect_location("CAFE02").await.unwrap();

    let link = ctx
        .snapshot()
        .saved_locations
        .iter()
        .find(|row| row.location_id == second.id)
        .map(|row| row.id)
        .expect("link missing");
    ctx.store.set_home_location(link).await.unwrap();

    let snapshot = ctx.snapshot();
    assert_eq!(snapshot.saved_locations[0].location_id, second.id);
    assert!(snapshot.saved_locations[0].is_home);
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_home_reassignment_reports_second_write_when_clearing_old_home_fails() {
    let ctx = TestContext::signed_in().await;
    let first = ctx.seed_location("Corner Roasters", "CAFE01");
    let second = ctx.seed_location("Harbor Beans", "CAFE02");
    ctx.store.connect_location("CAFE01").await.unwrap();
    ctx.store.connect_location("CAFE02").await.unwrap();

    let snapshot = ctx.snapshot();
    let old_home = snapshot.home_location().expect("no home location").id;
    let target = snapshot
        .saved_locations
        .iter()
        .find(|row| row.location_id == second.id)
        .map(|row| row.id)
        .expect("link missing");

    // Clearing the old home fails; the operation's outcome is the second
    // write's, so it still reports success.
    ctx.service.set_home_flag_failure(Some(old_home));
    ctx.store.set_home_location(target).await.unwrap();

    // The mandatory reload mirrors the authoritative (inconsistent) state:
    // both rows flagged home, with no silent local patch-up.
    let snapshot = ctx.snapshot();
    let homes: Vec<_> = snapshot
        .saved_locations
        .iter()
        .filter(|row| row.is_home)
        .map(|row| row.location_id)
        .collect();
    assert!(homes.contains(&first.id));
    assert!(homes.contains(&second.id));
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_home_reassignment_surfaces_second_write_failure() {
    let ctx = TestContext::signed_in().await;
    ctx.seed_location("Corner Roasters", "CAFE01");
    let second = ctx.seed_location("Harbor Beans", "CAFE02");
    ctx.store.connect_location("CAFE01").await.unwrap();
    ctx.store.connect_location("CAFE02").await.unwrap();

    let target = ctx
        .snapshot()
        .saved_locations
        .iter()
        .find(|row| row.location_id == second.id)
        .map(|row| row.id)
        .expect("link missing");

    // The old home clears, then promoting the target fails: the operation
    // reports the failure, and the reload leaves the snapshot showing the
    // transient zero-home state rather than an unconfirmed promotion.
    ctx.service.set_home_flag_failure(Some(target));
    let err = ctx.store.set_home_location(target).await.unwrap_err();
    assert!(matches!(err, StoreError::Remote(_)));

    let snapshot = ctx.snapshot();
    assert!(snapshot.home_location().is_none());
    assert_eq!(snapshot.saved_locations.len(), 2);
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_unknown_join_code_is_a_specific_not_found_message() {
    let ctx = TestContext::signed_in().await;

    let err = ctx.store.connect_location("NOPE99").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(err.to_string().contains("couldn't find a location"));
    ctx.store.shutdown();
}

#[tokio::test]
async fn test_malformed_join_code_is_rejected_locally() {
    let ctx = TestContext::signed_in().await;

    let err = ctx.store.connect_location("not a code!").await.unwrap_err();
    assert!(matches!(err, StoreError::JoinCode(_)));
    ctx.store.shutdown();
}
