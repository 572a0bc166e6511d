pub mod jwt_service;
pub mod paypal_service;
pub mod quota_service;
pub mod subscription_service;

pub use jwt_service::JwtService;
pub use paypal_service::PaypalService;
pub use quota_service::QuotaService;
pub use subscription_service::SubscriptionService;
