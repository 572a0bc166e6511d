//! Schema-level checks applied migrations must satisfy. Run with
//! `cargo test -- --ignored` and TEST_DATABASE_URL set.

use learncart_billing::models::common::LedgerStatus;
use sea_orm::{entity::*, query::*, ActiveValue::Set, PaginatorTrait};
use uuid::Uuid;

use crate::helpers::{create_user, setup_test_db};

#[tokio::test]
#[ignore] // Run only when database is available
async fn payment_rows_cascade_with_their_subscription() {
    let db = setup_test_db().await;
    let now = time::OffsetDateTime::now_utc();

    let user = create_user(&db, "pro", "active").await;
    let subscription = entity::subscriptions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        paypal_subscription_id: Set(format!("I-{}", Uuid::new_v4().simple())),
        paypal_plan_id: Set("P-MONTHLY".to_string()),
        status: Set(LedgerStatus::Active.as_str().to_string()),
        amount_cents: Set(499),
        currency: Set("USD".to_string()),
        billing_cycle: Set("monthly".to_string()),
        start_date: Set(Some(now)),
        next_billing_date: Set(None),
        last_payment_date: Set(None),
        last_payment_amount_cents: Set(None),
        cancelled_at: Set(None),
        cancel_reason: Set(None),
        approval_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    let payment = entity::subscription_payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        subscription_id: Set(subscription.id),
        paypal_payment_id: Set(format!("PAY-{}", Uuid::new_v4().simple())),
        amount_cents: Set(499),
        currency: Set("USD".to_string()),
        status: Set("completed".to_string()),
        paid_at: Set(now),
        created_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    entity::subscriptions::Entity::delete_by_id(subscription.id)
        .exec(&db)
        .await
        .unwrap();

    let survivors = entity::subscription_payments::Entity::find()
        .filter(entity::subscription_payments::Column::Id.eq(payment.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(survivors, 0);
}
