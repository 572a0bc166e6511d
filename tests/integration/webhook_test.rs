//! Webhook lifecycle tests: a mock gateway plus a real database. Run with
//! `cargo test -- --ignored` and TEST_DATABASE_URL set.

use std::sync::Arc;

use axum::http::HeaderMap;
use httpmock::prelude::*;
use learncart_billing::services::{PaypalService, SubscriptionService};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, PaginatorTrait};
use serde_json::json;
use uuid::Uuid;

use crate::helpers::{create_user, setup_test_db, test_config};

async fn insert_subscription(
    db: &DatabaseConnection,
    user_id: Uuid,
    paypal_subscription_id: &str,
    status: &str,
) -> entity::subscriptions::Model {
    let now = time::OffsetDateTime::now_utc();
    let record = entity::subscriptions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        paypal_subscription_id: Set(paypal_subscription_id.to_string()),
        paypal_plan_id: Set("P-MONTHLY".to_string()),
        status: Set(status.to_string()),
        amount_cents: Set(499),
        currency: Set("USD".to_string()),
        billing_cycle: Set("monthly".to_string()),
        start_date: Set(None),
        next_billing_date: Set(None),
        last_payment_date: Set(None),
        last_payment_amount_cents: Set(None),
        cancelled_at: Set(None),
        cancel_reason: Set(None),
        approval_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    record
        .insert(db)
        .await
        .expect("Failed to insert test subscription")
}

fn mock_token(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/v1/oauth2/token");
        then.status(200).json_body(json!({
            "access_token": "test-access-token",
            "token_type": "Bearer",
            "expires_in": 32400
        }));
    });
}

fn mock_subscription_detail(server: &MockServer, subscription_id: &str) {
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/billing/subscriptions/{}", subscription_id));
        then.status(200).json_body(json!({
            "id": subscription_id,
            "status": "ACTIVE",
            "start_time": "2026-08-01T10:00:00Z",
            "billing_info": { "next_billing_time": "2026-09-01T10:00:00Z" }
        }));
    });
}

fn service_against(db: DatabaseConnection, server: &MockServer) -> SubscriptionService {
    // webhook_id stays unset so the delivery skips signature verification
    let config = test_config(Some(server.base_url()));
    let paypal = Arc::new(PaypalService::new(&config.paypal).unwrap());
    SubscriptionService::new(db, paypal, &config)
}

fn activation_event(subscription_id: &str) -> String {
    json!({
        "event_type": "BILLING.SUBSCRIPTION.ACTIVATED",
        "resource": { "id": subscription_id }
    })
    .to_string()
}

#[tokio::test]
#[ignore] // Run only when database is available
async fn activation_upgrades_the_user_and_ledger() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;
    mock_token(&server);

    let user = create_user(&db, "free", "active").await;
    let subscription_id = format!("I-{}", Uuid::new_v4().simple());
    insert_subscription(&db, user.id, &subscription_id, "APPROVAL_PENDING").await;
    mock_subscription_detail(&server, &subscription_id);

    let service = service_against(db.clone(), &server);
    service
        .handle_event(&activation_event(&subscription_id), &HeaderMap::new())
        .await
        .unwrap();

    let updated_user = entity::users::Entity::find_by_id(user.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated_user.plan, "pro");
    assert_eq!(updated_user.subscription_status, "active");
    assert_eq!(
        updated_user.paypal_subscription_id.as_deref(),
        Some(subscription_id.as_str())
    );
    assert!(updated_user.current_period_end.is_some());
    assert_eq!(updated_user.featured_listings_used, 0);

    let ledger = entity::subscriptions::Entity::find()
        .filter(entity::subscriptions::Column::PaypalSubscriptionId.eq(subscription_id.as_str()))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.status, "ACTIVE");
    assert!(ledger.start_date.is_some());
}

#[tokio::test]
#[ignore]
async fn replayed_activation_preserves_usage_counters() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;
    mock_token(&server);

    let user = create_user(&db, "free", "active").await;
    let subscription_id = format!("I-{}", Uuid::new_v4().simple());
    insert_subscription(&db, user.id, &subscription_id, "APPROVAL_PENDING").await;
    mock_subscription_detail(&server, &subscription_id);

    let service = service_against(db.clone(), &server);
    let event = activation_event(&subscription_id);
    service.handle_event(&event, &HeaderMap::new()).await.unwrap();

    // Burn some usage between the first delivery and the replay
    let burned = entity::users::Entity::find_by_id(user.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let mut burned: entity::users::ActiveModel = burned.into();
    burned.featured_listings_used = Set(2);
    burned.bumps_used = Set(1);
    burned.update(&db).await.unwrap();

    service.handle_event(&event, &HeaderMap::new()).await.unwrap();

    let replayed = entity::users::Entity::find_by_id(user.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replayed.plan, "pro");
    assert_eq!(replayed.featured_listings_used, 2);
    assert_eq!(replayed.bumps_used, 1);
}

#[tokio::test]
#[ignore]
async fn cancellation_event_downgrades_immediately() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;
    mock_token(&server);

    let user = create_user(&db, "pro", "active").await;
    let subscription_id = format!("I-{}", Uuid::new_v4().simple());
    insert_subscription(&db, user.id, &subscription_id, "ACTIVE").await;

    let mut linked: entity::users::ActiveModel =
        entity::users::Entity::find_by_id(user.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .into();
    linked.paypal_subscription_id = Set(Some(subscription_id.clone()));
    linked.update(&db).await.unwrap();

    let service = service_against(db.clone(), &server);
    let event = json!({
        "event_type": "BILLING.SUBSCRIPTION.CANCELLED",
        "resource": { "id": subscription_id }
    })
    .to_string();
    service.handle_event(&event, &HeaderMap::new()).await.unwrap();

    let downgraded = entity::users::Entity::find_by_id(user.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(downgraded.plan, "free");
    assert_eq!(downgraded.subscription_status, "cancelled");
    assert_eq!(downgraded.paypal_subscription_id, None);

    let ledger = entity::subscriptions::Entity::find()
        .filter(entity::subscriptions::Column::PaypalSubscriptionId.eq(subscription_id.as_str()))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.status, "CANCELLED");
    assert!(ledger.cancelled_at.is_some());
}

#[tokio::test]
#[ignore]
async fn replayed_payment_is_recorded_once() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;
    mock_token(&server);

    let user = create_user(&db, "pro", "active").await;
    let subscription_id = format!("I-{}", Uuid::new_v4().simple());
    let record = insert_subscription(&db, user.id, &subscription_id, "ACTIVE").await;

    let service = service_against(db.clone(), &server);
    let payment_id = format!("PAY-{}", Uuid::new_v4().simple());
    let event = json!({
        "event_type": "PAYMENT.SALE.COMPLETED",
        "resource": {
            "id": payment_id,
            "billing_agreement_id": subscription_id,
            "amount": { "total": "4.99", "currency": "USD" }
        }
    })
    .to_string();

    service.handle_event(&event, &HeaderMap::new()).await.unwrap();
    service.handle_event(&event, &HeaderMap::new()).await.unwrap();

    let payment_count = entity::subscription_payments::Entity::find()
        .filter(entity::subscription_payments::Column::SubscriptionId.eq(record.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(payment_count, 1);

    let ledger = entity::subscriptions::Entity::find_by_id(record.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.last_payment_amount_cents, Some(499));
    assert!(ledger.last_payment_date.is_some());
}

#[tokio::test]
#[ignore]
async fn concurrent_payment_replays_record_once() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;
    mock_token(&server);

    let user = create_user(&db, "pro", "active").await;
    let subscription_id = format!("I-{}", Uuid::new_v4().simple());
    let record = insert_subscription(&db, user.id, &subscription_id, "ACTIVE").await;

    let service = service_against(db.clone(), &server);
    let payment_id = format!("PAY-{}", Uuid::new_v4().simple());
    let event = json!({
        "event_type": "PAYMENT.SALE.COMPLETED",
        "resource": {
            "id": payment_id,
            "billing_agreement_id": subscription_id,
            "amount": { "total": "4.99", "currency": "USD" }
        }
    })
    .to_string();

    // Five simultaneous deliveries of the same payment; the unique gateway
    // payment id must keep the ledger at one row with every ack succeeding
    let headers = HeaderMap::new();
    let deliveries = (0..5).map(|_| service.handle_event(&event, &headers));
    for outcome in futures::future::join_all(deliveries).await {
        outcome.unwrap();
    }

    let payment_count = entity::subscription_payments::Entity::find()
        .filter(entity::subscription_payments::Column::SubscriptionId.eq(record.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(payment_count, 1);
}

#[tokio::test]
#[ignore]
async fn unknown_subscription_and_event_types_are_acknowledged() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;

    let service = service_against(db, &server);

    // Unknown subscription id
    let event = activation_event("I-NEVER-SEEN");
    service.handle_event(&event, &HeaderMap::new()).await.unwrap();

    // Unhandled event type
    let event = json!({ "event_type": "BILLING.PLAN.UPDATED" }).to_string();
    service.handle_event(&event, &HeaderMap::new()).await.unwrap();

    // Garbage body still acks once the signature passed
    service.handle_event("not json", &HeaderMap::new()).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn user_cancel_calls_the_gateway_and_downgrades() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;
    mock_token(&server);

    let user = create_user(&db, "pro", "active").await;
    let subscription_id = format!("I-{}", Uuid::new_v4().simple());
    insert_subscription(&db, user.id, &subscription_id, "ACTIVE").await;

    let mut linked: entity::users::ActiveModel =
        entity::users::Entity::find_by_id(user.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .into();
    linked.paypal_subscription_id = Set(Some(subscription_id.clone()));
    linked.update(&db).await.unwrap();

    let cancel = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/billing/subscriptions/{}/cancel", subscription_id));
        then.status(204);
    });

    let service = service_against(db.clone(), &server);
    service
        .cancel(user.id, Some("Too expensive".to_string()))
        .await
        .unwrap();

    cancel.assert();

    let downgraded = entity::users::Entity::find_by_id(user.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(downgraded.plan, "free");

    let ledger = entity::subscriptions::Entity::find()
        .filter(entity::subscriptions::Column::PaypalSubscriptionId.eq(subscription_id.as_str()))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.status, "CANCELLED");
    assert_eq!(ledger.cancel_reason.as_deref(), Some("Too expensive"));
}

#[tokio::test]
#[ignore]
async fn cancel_without_subscription_is_not_found() {
    let db = setup_test_db().await;
    let server = MockServer::start_async().await;

    let user = create_user(&db, "free", "active").await;
    let service = service_against(db, &server);

    let result = service.cancel(user.id, None).await;
    assert!(result.is_err());
}
