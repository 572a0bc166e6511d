pub mod listings;
pub mod subscriptions;

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::{
    app_state::AppState,
    middleware::{jwt_auth_middleware, logging_middleware},
};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    // Seller-facing routes require a valid access token
    let protected_routes = Router::new()
        .route(
            "/subscriptions",
            post(subscriptions::create_subscription).get(subscriptions::subscription_status),
        )
        .route("/subscriptions/cancel", post(subscriptions::cancel_subscription))
        .route("/listings", post(listings::create_listing))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // The webhook authenticates via the gateway signature, not a JWT
    let public_routes =
        Router::new().route("/subscriptions/webhook", post(subscriptions::paypal_webhook));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(middleware::from_fn(logging_middleware))
}
