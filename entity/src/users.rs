use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User record including the denormalized subscription entitlement.
///
/// The `plan`/`subscription_status`/period columns are a cache of the current
/// entitlement, kept in sync with the `subscriptions` ledger on every
/// gateway webhook event. `paypal_subscription_id` is non-null only while
/// the user holds a pro subscription.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub plan: String,
    pub subscription_status: String,
    pub paypal_subscription_id: Option<String>,
    pub paypal_plan_id: Option<String>,
    pub billing_cycle: Option<String>,
    pub current_period_start: Option<TimeDateTimeWithTimeZone>,
    pub current_period_end: Option<TimeDateTimeWithTimeZone>,
    pub featured_listings_used: i32,
    pub bumps_used: i32,
    pub usage_reset_date: Option<TimeDateTimeWithTimeZone>,
    pub created_at: TimeDateTimeWithTimeZone,
    pub updated_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::listings::Entity")]
    Listings,
    #[sea_orm(has_many = "super::subscriptions::Entity")]
    Subscriptions,
}

impl Related<super::listings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listings.def()
    }
}

impl Related<super::subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
