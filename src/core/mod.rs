//! Core business logic - framework-agnostic billing, metering, analytics and
//! loyalty operations. Nothing in here knows about Discord.

/// Reservation analytics (occupancy, ADR, `RevPAR`, dashboards)
pub mod analytics;
/// Price, savings and discount per billing cycle
pub mod billing;
/// Loyalty points ledger
pub mod loyalty;
/// Subscription plan catalog
pub mod plan;
/// Text reports for the bot layer
pub mod report;
/// Rooms and reservations
pub mod reservation;
/// Organization subscriptions and billing periods
pub mod subscription;
/// Usage counters against plan quotas
pub mod usage;
