use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub application: ApplicationConfig,
    pub auth: AuthConfig,
    pub paypal: PaypalConfig,
    pub quota: QuotaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    // Public base URL of the marketplace frontend; PayPal redirects back here
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    // Shared with the main app, which mints the access tokens
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalConfig {
    pub client_id: String,
    pub client_secret: String,
    /// "sandbox" or "live"
    pub mode: String,
    /// Webhook id issued by PayPal; when absent, webhook signature
    /// verification is skipped (local development fallback).
    #[serde(default)]
    pub webhook_id: Option<String>,
    pub monthly: PlanConfig,
    pub annual: PlanConfig,
    pub currency: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Overrides the mode-derived API base. Used by tests pointing at a mock
    /// gateway.
    #[serde(default)]
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    /// PayPal billing plan id for this cycle. Left unset, initiating a
    /// subscription on this cycle is a configuration error, never a default.
    #[serde(default)]
    pub plan_id: Option<String>,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    // Maximum simultaneously active listings on the free tier
    pub free_max_active_listings: i64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl PaypalConfig {
    pub fn api_base(&self) -> String {
        if let Some(base) = &self.api_base {
            return base.clone();
        }
        match self.mode.as_str() {
            "live" => "https://api-m.paypal.com".to_string(),
            _ => "https://api-m.sandbox.paypal.com".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        // Build config from config.yml (required) with environment variable overrides
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(
                config::Environment::with_prefix("LEARNCART")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
