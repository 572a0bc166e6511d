//! Quota enforcement against a real database. Run with
//! `cargo test -- --ignored` and TEST_DATABASE_URL set.

use learncart_billing::{models::common::Plan, services::QuotaService};

use crate::helpers::{create_listing, create_user, setup_test_db, test_config};

#[tokio::test]
#[ignore] // Run only when database is available
async fn free_seller_is_capped_at_the_listing_limit() {
    let db = setup_test_db().await;
    let config = test_config(None);
    let service = QuotaService::new(db.clone(), config.quota.clone());

    let user = create_user(&db, "free", "active").await;

    for _ in 0..4 {
        create_listing(&db, user.id, "active").await;
    }
    let quota = service.can_create_listing(user.id).await.unwrap();
    assert!(quota.allowed);
    assert_eq!(quota.current, 4);
    assert_eq!(quota.limit, Some(5));

    create_listing(&db, user.id, "active").await;
    let quota = service.can_create_listing(user.id).await.unwrap();
    assert!(!quota.allowed);
    assert_eq!(quota.current, 5);
}

#[tokio::test]
#[ignore]
async fn sold_and_removed_listings_do_not_consume_quota() {
    let db = setup_test_db().await;
    let config = test_config(None);
    let service = QuotaService::new(db.clone(), config.quota.clone());

    let user = create_user(&db, "free", "active").await;
    for _ in 0..5 {
        create_listing(&db, user.id, "sold").await;
    }
    create_listing(&db, user.id, "removed").await;

    let quota = service.can_create_listing(user.id).await.unwrap();
    assert!(quota.allowed);
    assert_eq!(quota.current, 0);
}

#[tokio::test]
#[ignore]
async fn active_pro_seller_is_unlimited() {
    let db = setup_test_db().await;
    let config = test_config(None);
    let service = QuotaService::new(db.clone(), config.quota.clone());

    let user = create_user(&db, "pro", "active").await;
    for _ in 0..20 {
        create_listing(&db, user.id, "active").await;
    }

    let quota = service.can_create_listing(user.id).await.unwrap();
    assert!(quota.allowed);
    assert_eq!(quota.limit, None);
    assert_eq!(quota.plan, Plan::Pro);
}

#[tokio::test]
#[ignore]
async fn lapsed_pro_seller_is_held_to_the_free_cap() {
    let db = setup_test_db().await;
    let config = test_config(None);
    let service = QuotaService::new(db.clone(), config.quota.clone());

    // Plan column still says pro, but the subscription has lapsed
    let user = create_user(&db, "pro", "cancelled").await;
    for _ in 0..5 {
        create_listing(&db, user.id, "active").await;
    }

    let quota = service.can_create_listing(user.id).await.unwrap();
    assert!(!quota.allowed);
    assert_eq!(quota.limit, Some(5));
}

#[tokio::test]
#[ignore]
async fn snapshot_reports_plan_limits_and_usage() {
    let db = setup_test_db().await;
    let config = test_config(None);
    let service = QuotaService::new(db.clone(), config.quota.clone());

    let user = create_user(&db, "free", "active").await;
    create_listing(&db, user.id, "active").await;
    create_listing(&db, user.id, "sold").await;

    let snapshot = service.subscription_snapshot(user.id).await.unwrap();
    assert_eq!(snapshot.plan, Plan::Free);
    assert_eq!(snapshot.usage.active_listings, 1);
    assert_eq!(snapshot.usage.featured_listings_used, 0);
    assert!(!snapshot.features.unlimited_listings);
}
