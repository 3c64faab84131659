//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod loyalty_customer;
pub mod loyalty_transaction;
pub mod organization_subscription;
pub mod reservation;
pub mod room;
pub mod subscription_plan;
pub mod usage_metric;

// Re-export specific types to avoid conflicts
pub use loyalty_customer::{
    Column as LoyaltyCustomerColumn, Entity as LoyaltyCustomer, Model as LoyaltyCustomerModel,
};
pub use loyalty_transaction::{
    Column as LoyaltyTransactionColumn, Entity as LoyaltyTransaction,
    Model as LoyaltyTransactionModel,
};
pub use organization_subscription::{
    Column as OrganizationSubscriptionColumn, Entity as OrganizationSubscription,
    Model as OrganizationSubscriptionModel,
};
pub use reservation::{Column as ReservationColumn, Entity as Reservation, Model as ReservationModel};
pub use room::{Column as RoomColumn, Entity as Room, Model as RoomModel};
pub use subscription_plan::{
    Column as SubscriptionPlanColumn, Entity as SubscriptionPlan, Model as SubscriptionPlanModel,
};
pub use usage_metric::{Column as UsageMetricColumn, Entity as UsageMetric, Model as UsageMetricModel};
