pub mod listings;
pub mod prelude;
pub mod subscription_payments;
pub mod subscriptions;
pub mod users;
