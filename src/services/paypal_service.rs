use std::time::Duration;

use axum::http::HeaderMap;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::PaypalConfig,
    error::{ApiError, Result},
};

/// Thin client over the PayPal subscriptions REST API.
///
/// All outbound calls share one `reqwest::Client` bounded by the configured
/// request timeout; any transport or non-2xx failure maps to
/// `ApiError::Gateway`.
pub struct PaypalService {
    config: PaypalConfig,
    http_client: reqwest::Client,
}

/// Subscriber identity passed to the gateway on checkout
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Gateway response for a freshly created subscription
#[derive(Debug, Clone)]
pub struct CreatedSubscription {
    pub subscription_id: String,
    pub status: String,
    pub approval_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    rel: String,
    href: String,
}

/// Subscription detail as reported by the gateway
#[derive(Debug, Deserialize)]
pub struct GatewaySubscription {
    pub id: String,
    pub status: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<time::OffsetDateTime>,
    #[serde(default)]
    pub billing_info: Option<GatewayBillingInfo>,
}

#[derive(Debug, Deserialize)]
pub struct GatewayBillingInfo {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub next_billing_time: Option<time::OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verification_status: String,
}

/// The transmission headers PayPal attaches to every webhook delivery
#[derive(Debug)]
struct TransmissionHeaders {
    auth_algo: String,
    cert_url: String,
    transmission_id: String,
    transmission_sig: String,
    transmission_time: String,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn transmission_headers(headers: &HeaderMap) -> Option<TransmissionHeaders> {
    Some(TransmissionHeaders {
        auth_algo: header_value(headers, "paypal-auth-algo")?,
        cert_url: header_value(headers, "paypal-cert-url")?,
        transmission_id: header_value(headers, "paypal-transmission-id")?,
        transmission_sig: header_value(headers, "paypal-transmission-sig")?,
        transmission_time: header_value(headers, "paypal-transmission-time")?,
    })
}

impl PaypalService {
    pub fn new(config: &PaypalConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            config: config.clone(),
            http_client,
        })
    }

    /// OAuth client-credentials token fetch
    async fn access_token(&self) -> Result<String> {
        let auth = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));

        let response = self
            .http_client
            .post(format!("{}/v1/oauth2/token", self.config.api_base()))
            .header("Authorization", format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ApiError::Gateway(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Gateway(format!(
                "Token request rejected with status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Gateway(format!("Malformed token response: {}", e)))?;

        Ok(token.access_token)
    }

    /// Create a gateway-side subscription tied to the subscriber's identity.
    /// Returns the approval URL the user must be redirected to.
    #[instrument(skip(self, subscriber))]
    pub async fn create_subscription(
        &self,
        plan_id: &str,
        subscriber: &Subscriber,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<CreatedSubscription> {
        let access_token = self.access_token().await?;

        let mut name_parts = subscriber.name.split_whitespace();
        let given_name = name_parts.next().unwrap_or("User").to_string();
        let surname = name_parts.collect::<Vec<_>>().join(" ");

        let request_body = json!({
            "plan_id": plan_id,
            "subscriber": {
                "name": {
                    "given_name": given_name,
                    "surname": surname,
                },
                "email_address": subscriber.email,
            },
            "application_context": {
                "brand_name": "LearnCart",
                "locale": "en-US",
                "shipping_preference": "NO_SHIPPING",
                "user_action": "SUBSCRIBE_NOW",
                "payment_method": {
                    "payer_selected": "PAYPAL",
                    "payee_preferred": "IMMEDIATE_PAYMENT_REQUIRED",
                },
                "return_url": return_url,
                "cancel_url": cancel_url,
            },
        });

        let request_id = format!(
            "sub-{}-{}",
            subscriber.id,
            time::OffsetDateTime::now_utc().unix_timestamp()
        );

        let response = self
            .http_client
            .post(format!(
                "{}/v1/billing/subscriptions",
                self.config.api_base()
            ))
            .bearer_auth(&access_token)
            .header("PayPal-Request-Id", request_id)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ApiError::Gateway(format!("Subscription creation failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Gateway(format!(
                "Subscription creation rejected with status {}: {}",
                status, body
            )));
        }

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Gateway(format!("Malformed creation response: {}", e)))?;

        let approval_url = created
            .links
            .iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href.clone())
            .ok_or_else(|| {
                ApiError::Gateway("Gateway returned no approval link".to_string())
            })?;

        info!(
            subscription_id = %created.id,
            status = %created.status,
            "Created gateway subscription"
        );

        Ok(CreatedSubscription {
            subscription_id: created.id,
            status: created.status,
            approval_url,
        })
    }

    /// Fetch the full subscription detail (billing period dates live here)
    #[instrument(skip(self))]
    pub async fn get_subscription(&self, subscription_id: &str) -> Result<GatewaySubscription> {
        let access_token = self.access_token().await?;

        let response = self
            .http_client
            .get(format!(
                "{}/v1/billing/subscriptions/{}",
                self.config.api_base(),
                subscription_id
            ))
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| ApiError::Gateway(format!("Subscription lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Gateway(format!(
                "Subscription lookup rejected with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Gateway(format!("Malformed subscription detail: {}", e)))
    }

    /// Cancel the subscription at the gateway
    #[instrument(skip(self))]
    pub async fn cancel_subscription(&self, subscription_id: &str, reason: &str) -> Result<()> {
        let access_token = self.access_token().await?;

        let response = self
            .http_client
            .post(format!(
                "{}/v1/billing/subscriptions/{}/cancel",
                self.config.api_base(),
                subscription_id
            ))
            .bearer_auth(&access_token)
            .json(&json!({ "reason": reason }))
            .send()
            .await
            .map_err(|e| ApiError::Gateway(format!("Subscription cancel failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Gateway(format!(
                "Subscription cancel rejected with status {}",
                response.status()
            )));
        }

        info!(subscription_id, "Cancelled gateway subscription");
        Ok(())
    }

    /// Verify a webhook delivery against the gateway.
    ///
    /// Returns `Ok(true)` without calling out when no webhook id is
    /// configured (local development fallback). Missing transmission
    /// headers, an unparsable body, or a non-SUCCESS verdict all come back
    /// as `Ok(false)` so the caller fails closed.
    #[instrument(skip(self, headers, raw_body))]
    pub async fn verify_webhook_signature(
        &self,
        headers: &HeaderMap,
        raw_body: &str,
    ) -> Result<bool> {
        let webhook_id = match &self.config.webhook_id {
            Some(id) => id.clone(),
            None => {
                warn!("No PayPal webhook id configured; skipping signature verification");
                return Ok(true);
            }
        };

        let transmission = match transmission_headers(headers) {
            Some(t) => t,
            None => {
                warn!("Webhook delivery missing PayPal transmission headers");
                return Ok(false);
            }
        };

        let webhook_event: serde_json::Value = match serde_json::from_str(raw_body) {
            Ok(event) => event,
            Err(e) => {
                warn!("Webhook body is not valid JSON: {}", e);
                return Ok(false);
            }
        };

        let access_token = self.access_token().await?;

        let request_body = json!({
            "auth_algo": transmission.auth_algo,
            "cert_url": transmission.cert_url,
            "transmission_id": transmission.transmission_id,
            "transmission_sig": transmission.transmission_sig,
            "transmission_time": transmission.transmission_time,
            "webhook_id": webhook_id,
            "webhook_event": webhook_event,
        });

        let response = self
            .http_client
            .post(format!(
                "{}/v1/notifications/verify-webhook-signature",
                self.config.api_base()
            ))
            .bearer_auth(&access_token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ApiError::Gateway(format!("Signature verification failed: {}", e)))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let verdict: VerifyResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Gateway(format!("Malformed verification response: {}", e)))?;

        Ok(verdict.verification_status == "SUCCESS")
    }
}
