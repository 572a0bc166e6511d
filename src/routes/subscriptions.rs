use axum::{extract::State, http::HeaderMap, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::UserIdentity,
    models::{
        common::MessageResponse,
        subscription::{
            CancelSubscriptionRequest, CreateSubscriptionRequest, CreateSubscriptionResponse,
            SubscriptionStatusResponse,
        },
    },
};

/// POST /api/v1/subscriptions
#[instrument(skip(state, identity, request))]
pub async fn create_subscription(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<Json<CreateSubscriptionResponse>> {
    let checkout = state
        .subscription_service
        .initiate(identity.user_id, request.billing_cycle)
        .await?;

    Ok(Json(CreateSubscriptionResponse {
        success: true,
        data: checkout,
    }))
}

/// GET /api/v1/subscriptions
#[instrument(skip(state, identity))]
pub async fn subscription_status(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<SubscriptionStatusResponse>> {
    let snapshot = state
        .quota_service
        .subscription_snapshot(identity.user_id)
        .await?;

    Ok(Json(SubscriptionStatusResponse {
        success: true,
        data: snapshot,
    }))
}

/// POST /api/v1/subscriptions/cancel
#[instrument(skip(state, identity, request))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    identity: UserIdentity,
    Json(request): Json<CancelSubscriptionRequest>,
) -> Result<Json<MessageResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    state
        .subscription_service
        .cancel(identity.user_id, request.reason)
        .await?;

    Ok(Json(MessageResponse::new("Subscription cancelled")))
}

/// POST /api/v1/subscriptions/webhook
///
/// Public endpoint. Authentication is the gateway signature carried in the
/// paypal-* headers; the raw body must reach verification unmodified.
#[instrument(skip(state, headers, body))]
pub async fn paypal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<MessageResponse>> {
    state.subscription_service.handle_event(&body, &headers).await?;

    Ok(Json(MessageResponse::new("Event received")))
}
