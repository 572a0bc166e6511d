use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::{BillingCycle, Plan, PlanLimits, SubscriptionStatus};

/// Request to start a PayPal checkout
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub billing_cycle: BillingCycle,
}

/// Response for subscription creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    pub success: bool,
    pub data: PendingCheckout,
}

/// Result of initiating a checkout: the ledger row exists in
/// APPROVAL_PENDING and the caller must redirect to `approval_url`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheckout {
    pub subscription_id: String,
    pub approval_url: String,
    pub billing_cycle: BillingCycle,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    #[validate(length(max = 500))]
    #[serde(default)]
    pub reason: Option<String>,
}

/// Response for the subscription status snapshot
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub success: bool,
    pub data: SubscriptionSnapshot,
}

/// Current plan/status/limits/usage, derived from the embedded subscription
/// plus the active-listing count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnapshot {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub billing_cycle: Option<BillingCycle>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub current_period_end: Option<time::OffsetDateTime>,
    pub limits: PlanLimits,
    pub usage: SubscriptionUsage,
    pub features: PlanFeatures,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUsage {
    pub active_listings: i64,
    pub featured_listings_used: i32,
    pub bumps_used: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFeatures {
    pub unlimited_listings: bool,
    pub featured_listings: bool,
    pub bumps: bool,
    pub verified_badge: bool,
    pub priority_support: bool,
    pub no_ads: bool,
}

impl PlanFeatures {
    pub fn for_plan(plan: Plan) -> Self {
        let pro = plan == Plan::Pro;
        Self {
            unlimited_listings: pro,
            featured_listings: pro,
            bumps: pro,
            verified_badge: pro,
            priority_support: pro,
            no_ads: pro,
        }
    }
}
