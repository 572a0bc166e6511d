use axum::{extract::State, Json};
use sea_orm::{entity::*, ActiveValue::Set};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::listing::{CreateListingRequest, CreateListingResponse, ListingData, ListingQuota},
};

/// POST /api/v1/listings
///
/// The quota check and the insert are two statements; concurrent requests
/// from one seller can land one listing past the cap. Accepted: the cap is
/// a product lever, not a hard integrity constraint.
#[instrument(skip(state, identity, request))]
pub async fn create_listing(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<CreateListingRequest>,
) -> Result<Json<CreateListingResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let quota = state.quota_service.can_create_listing(identity.user_id).await?;
    if !quota.allowed {
        return Err(ApiError::QuotaExceeded {
            current: quota.current,
            limit: quota.limit.unwrap_or(0),
        });
    }

    let now = time::OffsetDateTime::now_utc();
    let listing = entity::listings::ActiveModel {
        id: Set(Uuid::new_v4()),
        seller_id: Set(identity.user_id),
        title: Set(request.title.clone()),
        description: Set(request.description),
        price_cents: Set(request.price_cents),
        status: Set("active".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let inserted = listing.insert(&state.db).await?;

    info!(
        user_id = %identity.user_id,
        listing_id = %inserted.id,
        "Listing created"
    );

    // Reflect the listing that was just created in the reported usage
    let quota = match quota.limit {
        Some(limit) => ListingQuota::decide(quota.plan, quota.current + 1, limit),
        None => quota,
    };

    Ok(Json(CreateListingResponse {
        success: true,
        data: ListingData {
            id: inserted.id,
            title: inserted.title,
            status: inserted.status,
            quota,
        },
    }))
}
