pub use super::listings::Entity as Listings;
pub use super::subscription_payments::Entity as SubscriptionPayments;
pub use super::subscriptions::Entity as Subscriptions;
pub use super::users::Entity as Users;
