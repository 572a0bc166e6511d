use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::Config,
    services::{JwtService, PaypalService, QuotaService, SubscriptionService},
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub paypal_service: Arc<PaypalService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub quota_service: Arc<QuotaService>,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let db = sea_orm::Database::connect(&config.database.url).await?;
        Self::with_connection(db, config)
    }

    /// Build the state on an existing connection. Tests use this to point
    /// the services at a prepared database.
    pub fn with_connection(
        db: DatabaseConnection,
        config: Config,
    ) -> Result<Self, anyhow::Error> {
        let paypal_service = Arc::new(PaypalService::new(&config.paypal)?);
        let subscription_service = Arc::new(SubscriptionService::new(
            db.clone(),
            paypal_service.clone(),
            &config,
        ));
        let quota_service = Arc::new(QuotaService::new(db.clone(), config.quota.clone()));
        let jwt_service = Arc::new(JwtService::new(&config.auth));

        Ok(Self {
            db,
            paypal_service,
            subscription_service,
            quota_service,
            jwt_service,
            config: Arc::new(config),
        })
    }
}
