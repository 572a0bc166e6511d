use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Durable billing ledger, one row per PayPal subscription lifecycle.
///
/// Status follows the gateway's enum (APPROVAL_PENDING, APPROVED, ACTIVE,
/// SUSPENDED, CANCELLED, EXPIRED). Terminal statuses never transition
/// backward. Amounts are integer cents.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub paypal_subscription_id: String,
    pub paypal_plan_id: String,
    pub status: String,
    pub amount_cents: i64,
    pub currency: String,
    pub billing_cycle: String,
    pub start_date: Option<TimeDateTimeWithTimeZone>,
    pub next_billing_date: Option<TimeDateTimeWithTimeZone>,
    pub last_payment_date: Option<TimeDateTimeWithTimeZone>,
    pub last_payment_amount_cents: Option<i64>,
    pub cancelled_at: Option<TimeDateTimeWithTimeZone>,
    pub cancel_reason: Option<String>,
    pub approval_url: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::subscription_payments::Entity")]
    SubscriptionPayments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::subscription_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
