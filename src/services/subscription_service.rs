use std::sync::Arc;

use axum::http::HeaderMap;
use sea_orm::{
    entity::*, query::*, sea_query::OnConflict, DatabaseConnection, DbErr, TransactionTrait,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::{ApplicationConfig, Config, PaypalConfig},
    error::{ApiError, Result},
    models::{
        common::{BillingCycle, LedgerStatus, Plan, SubscriptionStatus},
        subscription::PendingCheckout,
    },
    services::paypal_service::{PaypalService, Subscriber},
};

/// Applies PayPal lifecycle events to the subscription ledger and the
/// entitlement cached on the owning user record.
///
/// Both writes happen inside one transaction, ledger first, so the two views
/// never diverge past a single event-processing call.
pub struct SubscriptionService {
    db: DatabaseConnection,
    paypal: Arc<PaypalService>,
    paypal_config: PaypalConfig,
    application: ApplicationConfig,
}

/// Webhook envelope; only the fields this service consumes
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event_type: String,
    #[serde(default)]
    resource: Option<EventResource>,
}

#[derive(Debug, Default, Deserialize)]
struct EventResource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    billing_agreement_id: Option<String>,
    #[serde(default)]
    amount: Option<ResourceAmount>,
}

#[derive(Debug, Deserialize)]
struct ResourceAmount {
    total: String,
    currency: String,
}

/// Dispatch variants for the gateway event types this service understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatewayEventKind {
    Activated,
    Terminated(LedgerStatus),
    PaymentCompleted,
    Other,
}

impl GatewayEventKind {
    fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "BILLING.SUBSCRIPTION.ACTIVATED" => Self::Activated,
            "BILLING.SUBSCRIPTION.CANCELLED" => Self::Terminated(LedgerStatus::Cancelled),
            "BILLING.SUBSCRIPTION.SUSPENDED" => Self::Terminated(LedgerStatus::Suspended),
            "BILLING.SUBSCRIPTION.EXPIRED" => Self::Terminated(LedgerStatus::Expired),
            "PAYMENT.SALE.COMPLETED" => Self::PaymentCompleted,
            _ => Self::Other,
        }
    }
}

/// Parse a gateway decimal amount ("4.99") into integer cents
fn parse_amount_cents(total: &str) -> Option<i64> {
    // "-0.99" parses its dollar part to 0, so the sign must be checked on
    // the raw string
    if total.starts_with('-') {
        return None;
    }
    let mut parts = total.splitn(2, '.');
    let dollars: i64 = parts.next()?.parse().ok()?;
    let cents = match parts.next() {
        None => 0,
        Some(frac) => {
            if frac.is_empty() || frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let frac_value: i64 = frac.parse().ok()?;
            if frac.len() == 1 {
                frac_value * 10
            } else {
                frac_value
            }
        }
    };
    Some(dollars * 100 + cents)
}

impl SubscriptionService {
    pub fn new(db: DatabaseConnection, paypal: Arc<PaypalService>, config: &Config) -> Self {
        Self {
            db,
            paypal,
            paypal_config: config.paypal.clone(),
            application: config.application.clone(),
        }
    }

    /// Start a PayPal checkout for the given billing cycle.
    ///
    /// The ledger row is written only after the gateway call succeeded, so a
    /// gateway failure never leaves a dangling local record. The user stays
    /// on the free plan until the activation webhook arrives.
    #[instrument(skip(self))]
    pub async fn initiate(
        &self,
        user_id: Uuid,
        billing_cycle: BillingCycle,
    ) -> Result<PendingCheckout> {
        let plan_config = match billing_cycle {
            BillingCycle::Monthly => &self.paypal_config.monthly,
            BillingCycle::Annual => &self.paypal_config.annual,
        };
        let plan_id = plan_config.plan_id.clone().ok_or_else(|| {
            ApiError::Configuration(format!(
                "No PayPal plan id configured for the {} billing cycle",
                billing_cycle.as_str()
            ))
        })?;

        let user = entity::users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let subscriber = Subscriber {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name.clone(),
        };
        let return_url = format!("{}/upgrade/success", self.application.base_url);
        let cancel_url = format!("{}/upgrade?cancelled=true", self.application.base_url);

        let created = self
            .paypal
            .create_subscription(&plan_id, &subscriber, &return_url, &cancel_url)
            .await?;

        let now = time::OffsetDateTime::now_utc();
        let record = entity::subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            paypal_subscription_id: Set(created.subscription_id.clone()),
            paypal_plan_id: Set(plan_id),
            status: Set(LedgerStatus::ApprovalPending.as_str().to_string()),
            amount_cents: Set(plan_config.price_cents),
            currency: Set(self.paypal_config.currency.clone()),
            billing_cycle: Set(billing_cycle.as_str().to_string()),
            start_date: Set(None),
            next_billing_date: Set(None),
            last_payment_date: Set(None),
            last_payment_amount_cents: Set(None),
            cancelled_at: Set(None),
            cancel_reason: Set(None),
            approval_url: Set(Some(created.approval_url.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        record.insert(&self.db).await?;

        info!(
            user_id = %user_id,
            subscription_id = %created.subscription_id,
            billing_cycle = billing_cycle.as_str(),
            "Created pending subscription"
        );

        Ok(PendingCheckout {
            subscription_id: created.subscription_id,
            approval_url: created.approval_url,
            billing_cycle,
            amount_cents: plan_config.price_cents,
            currency: self.paypal_config.currency.clone(),
        })
    }

    /// Process one webhook delivery.
    ///
    /// Signature verification failures reject the delivery. Everything past
    /// verification is acknowledged unconditionally: the gateway retries the
    /// same event until it gets a 2xx, so internal failures are logged for
    /// operator diagnosis and swallowed here.
    #[instrument(skip(self, raw_body, headers))]
    pub async fn handle_event(&self, raw_body: &str, headers: &HeaderMap) -> Result<()> {
        match self.paypal.verify_webhook_signature(headers, raw_body).await {
            Ok(true) => {}
            Ok(false) => return Err(ApiError::InvalidSignature),
            Err(e) => {
                // Cannot verify means cannot trust; fail closed
                warn!("Webhook signature verification unavailable: {}", e);
                return Err(ApiError::InvalidSignature);
            }
        }

        if let Err(e) = self.apply_event(raw_body).await {
            error!("Webhook processing failed, acknowledging anyway: {:?}", e);
        }
        Ok(())
    }

    async fn apply_event(&self, raw_body: &str) -> Result<()> {
        let event: WebhookEvent = match serde_json::from_str(raw_body) {
            Ok(event) => event,
            Err(e) => {
                warn!("Discarding malformed webhook payload: {}", e);
                return Ok(());
            }
        };
        let resource = event.resource.unwrap_or_default();

        match GatewayEventKind::from_event_type(&event.event_type) {
            GatewayEventKind::Activated => match resource.id {
                Some(subscription_id) => self.apply_activation(&subscription_id).await,
                None => {
                    warn!("Activation event without a subscription id");
                    Ok(())
                }
            },
            GatewayEventKind::Terminated(status) => match resource.id {
                Some(subscription_id) => self.apply_termination(&subscription_id, status).await,
                None => {
                    warn!("Termination event without a subscription id");
                    Ok(())
                }
            },
            GatewayEventKind::PaymentCompleted => self.apply_payment(resource).await,
            GatewayEventKind::Other => {
                info!(event_type = %event.event_type, "Ignoring unhandled webhook event");
                Ok(())
            }
        }
    }

    /// BILLING.SUBSCRIPTION.ACTIVATED: ledger to ACTIVE, user to pro.
    ///
    /// Period dates are re-derived from the gateway on every delivery, so a
    /// redelivered event converges to the same state. Usage counters reset
    /// only on the first activation, never on a replay.
    async fn apply_activation(&self, subscription_id: &str) -> Result<()> {
        let record = entity::subscriptions::Entity::find()
            .filter(
                entity::subscriptions::Column::PaypalSubscriptionId.eq(subscription_id),
            )
            .one(&self.db)
            .await?;

        let Some(record) = record else {
            // Unknown id: already processed or never ours; ack without writes
            info!(subscription_id, "Activation for unknown subscription, ignoring");
            return Ok(());
        };

        let detail = self.paypal.get_subscription(subscription_id).await?;
        let period_start = detail.start_time;
        let period_end = detail
            .billing_info
            .as_ref()
            .and_then(|info| info.next_billing_time);

        let was_active = record.status == LedgerStatus::Active.as_str();
        let user_id = record.user_id;
        let paypal_plan_id = record.paypal_plan_id.clone();
        let billing_cycle = record.billing_cycle.clone();
        let now = time::OffsetDateTime::now_utc();

        let txn = self.db.begin().await?;

        // Ledger first; it is the audit trail
        let mut ledger: entity::subscriptions::ActiveModel = record.into();
        ledger.status = Set(LedgerStatus::Active.as_str().to_string());
        ledger.start_date = Set(period_start);
        ledger.next_billing_date = Set(period_end);
        ledger.updated_at = Set(now);
        ledger.update(&txn).await?;

        match entity::users::Entity::find_by_id(user_id).one(&txn).await? {
            Some(user) => {
                let already_pro = user.plan == Plan::Pro.as_str()
                    && user.paypal_subscription_id.as_deref() == Some(subscription_id);

                let mut user_active: entity::users::ActiveModel = user.into();
                user_active.plan = Set(Plan::Pro.as_str().to_string());
                user_active.subscription_status =
                    Set(SubscriptionStatus::Active.as_str().to_string());
                user_active.paypal_subscription_id = Set(Some(subscription_id.to_string()));
                user_active.paypal_plan_id = Set(Some(paypal_plan_id));
                user_active.billing_cycle = Set(Some(billing_cycle));
                user_active.current_period_start = Set(period_start);
                user_active.current_period_end = Set(period_end);
                if !(was_active && already_pro) {
                    user_active.featured_listings_used = Set(0);
                    user_active.bumps_used = Set(0);
                    user_active.usage_reset_date = Set(Some(now));
                }
                user_active.updated_at = Set(now);
                user_active.update(&txn).await?;
            }
            None => {
                warn!(subscription_id, %user_id, "Activation for a missing user");
            }
        }

        txn.commit().await?;

        info!(subscription_id, %user_id, "User upgraded to pro");
        Ok(())
    }

    /// CANCELLED / SUSPENDED / EXPIRED: ledger to the terminal status, user
    /// back to free. A ledger row already in a terminal state keeps its
    /// first terminal status; the user downgrade itself is idempotent.
    async fn apply_termination(
        &self,
        subscription_id: &str,
        status: LedgerStatus,
    ) -> Result<()> {
        let record = entity::subscriptions::Entity::find()
            .filter(
                entity::subscriptions::Column::PaypalSubscriptionId.eq(subscription_id),
            )
            .one(&self.db)
            .await?;

        let Some(record) = record else {
            info!(subscription_id, "Termination for unknown subscription, ignoring");
            return Ok(());
        };

        let user_id = record.user_id;
        let already_terminal = LedgerStatus::from_str(&record.status)
            .map(|s| s.is_terminal())
            .unwrap_or(false);
        let now = time::OffsetDateTime::now_utc();

        let txn = self.db.begin().await?;

        if !already_terminal {
            let mut ledger: entity::subscriptions::ActiveModel = record.into();
            ledger.status = Set(status.as_str().to_string());
            ledger.cancelled_at = Set(Some(now));
            ledger.updated_at = Set(now);
            ledger.update(&txn).await?;
        }

        if let Some(user) = entity::users::Entity::find_by_id(user_id).one(&txn).await? {
            let mut user_active: entity::users::ActiveModel = user.into();
            user_active.plan = Set(Plan::Free.as_str().to_string());
            user_active.subscription_status =
                Set(SubscriptionStatus::Cancelled.as_str().to_string());
            user_active.paypal_subscription_id = Set(None);
            user_active.paypal_plan_id = Set(None);
            user_active.billing_cycle = Set(None);
            user_active.updated_at = Set(now);
            user_active.update(&txn).await?;
        }

        txn.commit().await?;

        info!(
            subscription_id,
            %user_id,
            status = status.as_str(),
            "User downgraded to free"
        );
        Ok(())
    }

    /// PAYMENT.SALE.COMPLETED: append a payment row and refresh the
    /// last-payment columns. The unique gateway payment id makes a
    /// redelivered event a no-op. No plan or status change.
    async fn apply_payment(&self, resource: EventResource) -> Result<()> {
        let Some(agreement_id) = resource.billing_agreement_id else {
            warn!("Payment event without a billing agreement id");
            return Ok(());
        };
        let record = entity::subscriptions::Entity::find()
            .filter(entity::subscriptions::Column::PaypalSubscriptionId.eq(agreement_id.as_str()))
            .one(&self.db)
            .await?;
        let Some(record) = record else {
            info!(
                agreement_id = %agreement_id,
                "Payment for unknown subscription, ignoring"
            );
            return Ok(());
        };
        let Some(payment_id) = resource.id else {
            warn!("Payment event without a payment id");
            return Ok(());
        };
        let Some(amount) = resource.amount else {
            warn!("Payment event without an amount");
            return Ok(());
        };
        let Some(amount_cents) = parse_amount_cents(&amount.total) else {
            warn!(total = %amount.total, "Payment event with an unparsable amount");
            return Ok(());
        };

        let now = time::OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        let payment = entity::subscription_payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            subscription_id: Set(record.id),
            paypal_payment_id: Set(payment_id.clone()),
            amount_cents: Set(amount_cents),
            currency: Set(amount.currency.clone()),
            status: Set("completed".to_string()),
            paid_at: Set(now),
            created_at: Set(now),
        };

        let inserted = entity::subscription_payments::Entity::insert(payment)
            .on_conflict(
                OnConflict::column(entity::subscription_payments::Column::PaypalPaymentId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&txn)
            .await;

        match inserted {
            Ok(_) => {}
            Err(DbErr::RecordNotInserted) => {
                // Redelivery of a payment we already hold
                info!(payment_id = %payment_id, "Payment already recorded, ignoring");
                txn.commit().await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let mut ledger: entity::subscriptions::ActiveModel = record.into();
        ledger.last_payment_date = Set(Some(now));
        ledger.last_payment_amount_cents = Set(Some(amount_cents));
        ledger.updated_at = Set(now);
        ledger.update(&txn).await?;

        txn.commit().await?;

        info!(
            agreement_id = %agreement_id,
            payment_id = %payment_id,
            amount_cents,
            "Recorded subscription payment"
        );
        Ok(())
    }

    /// Cancel the caller's subscription at the gateway and locally.
    ///
    /// The gateway call runs first; if it fails, no local state changes.
    /// The embedded entitlement drops to free immediately.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: Uuid, reason: Option<String>) -> Result<()> {
        let user = entity::users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let subscription_id = user
            .paypal_subscription_id
            .clone()
            .ok_or_else(|| ApiError::NotFound("No active subscription found".to_string()))?;

        let reason = reason.unwrap_or_else(|| "Cancelled by user".to_string());

        self.paypal
            .cancel_subscription(&subscription_id, &reason)
            .await?;

        let now = time::OffsetDateTime::now_utc();
        let txn = self.db.begin().await?;

        if let Some(record) = entity::subscriptions::Entity::find()
            .filter(
                entity::subscriptions::Column::PaypalSubscriptionId.eq(subscription_id.as_str()),
            )
            .one(&txn)
            .await?
        {
            let mut ledger: entity::subscriptions::ActiveModel = record.into();
            ledger.status = Set(LedgerStatus::Cancelled.as_str().to_string());
            ledger.cancelled_at = Set(Some(now));
            ledger.cancel_reason = Set(Some(reason.clone()));
            ledger.updated_at = Set(now);
            ledger.update(&txn).await?;
        }

        let mut user_active: entity::users::ActiveModel = user.into();
        user_active.plan = Set(Plan::Free.as_str().to_string());
        user_active.subscription_status = Set(SubscriptionStatus::Cancelled.as_str().to_string());
        user_active.paypal_subscription_id = Set(None);
        user_active.paypal_plan_id = Set(None);
        user_active.billing_cycle = Set(None);
        user_active.updated_at = Set(now);
        user_active.update(&txn).await?;

        txn.commit().await?;

        info!(%user_id, subscription_id = %subscription_id, "Subscription cancelled");
        Ok(())
    }
}
