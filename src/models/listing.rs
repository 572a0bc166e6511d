use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::common::Plan;

/// Request to create a listing
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[validate(length(min = 3, max = 120))]
    pub title: String,

    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: Option<String>,

    #[validate(range(min = 0))]
    pub price_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingResponse {
    pub success: bool,
    pub data: ListingData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingData {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub quota: ListingQuota,
}

/// Outcome of the listing-quota check. `limit = None` means unlimited.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuota {
    pub allowed: bool,
    pub current: i64,
    pub limit: Option<i64>,
    pub plan: Plan,
}

impl ListingQuota {
    /// Decision for a counted (free-tier) seller.
    pub fn decide(plan: Plan, current: i64, limit: i64) -> Self {
        Self {
            allowed: current < limit,
            current,
            limit: Some(limit),
            plan,
        }
    }

    /// Decision for an unlimited plan; no listing count is performed.
    pub fn unlimited(plan: Plan) -> Self {
        Self {
            allowed: true,
            current: 0,
            limit: None,
            plan,
        }
    }
}
