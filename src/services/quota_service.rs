use sea_orm::{entity::*, query::*, DatabaseConnection, PaginatorTrait};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    config::QuotaConfig,
    error::{ApiError, Result},
    models::{
        common::{BillingCycle, Plan, PlanLimits, SubscriptionStatus},
        listing::ListingQuota,
        subscription::{PlanFeatures, SubscriptionSnapshot, SubscriptionUsage},
    },
};

/// Enforces the per-plan listing quota and assembles the subscription
/// status snapshot.
pub struct QuotaService {
    db: DatabaseConnection,
    config: QuotaConfig,
}

impl QuotaService {
    pub fn new(db: DatabaseConnection, config: QuotaConfig) -> Self {
        Self { db, config }
    }

    /// Decide whether the seller may create another listing.
    ///
    /// Pro sellers with an active subscription skip the count entirely.
    /// Everyone else, including a pro seller whose subscription has lapsed,
    /// is held to the free-tier cap. Only listings in the `active` status
    /// consume quota.
    #[instrument(skip(self))]
    pub async fn can_create_listing(&self, user_id: Uuid) -> Result<ListingQuota> {
        let user = entity::users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let entitled = user.plan == Plan::Pro.as_str()
            && user.subscription_status == SubscriptionStatus::Active.as_str();
        if entitled {
            return Ok(ListingQuota::unlimited(Plan::Pro));
        }

        let current = self.count_active_listings(user_id).await?;
        let quota =
            ListingQuota::decide(Plan::Free, current, self.config.free_max_active_listings);
        if !quota.allowed {
            info!(
                %user_id,
                current,
                limit = self.config.free_max_active_listings,
                "Listing quota exhausted"
            );
        }
        Ok(quota)
    }

    /// Plan, status, limits, and current usage for the given user.
    #[instrument(skip(self))]
    pub async fn subscription_snapshot(&self, user_id: Uuid) -> Result<SubscriptionSnapshot> {
        let user = entity::users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let active_listings = self.count_active_listings(user_id).await?;

        let plan = Plan::from_str(&user.plan).unwrap_or(Plan::Free);
        let status =
            SubscriptionStatus::from_str(&user.subscription_status).unwrap_or(SubscriptionStatus::Active);
        let billing_cycle = user
            .billing_cycle
            .as_deref()
            .and_then(BillingCycle::from_str);

        Ok(SubscriptionSnapshot {
            plan,
            status,
            billing_cycle,
            current_period_end: user.current_period_end,
            limits: PlanLimits::for_plan(plan, self.config.free_max_active_listings),
            usage: SubscriptionUsage {
                active_listings,
                featured_listings_used: user.featured_listings_used,
                bumps_used: user.bumps_used,
            },
            features: PlanFeatures::for_plan(plan),
        })
    }

    async fn count_active_listings(&self, user_id: Uuid) -> Result<i64> {
        let count = entity::listings::Entity::find()
            .filter(entity::listings::Column::SellerId.eq(user_id))
            .filter(entity::listings::Column::Status.eq("active"))
            .count(&self.db)
            .await?;
        Ok(count as i64)
    }
}
