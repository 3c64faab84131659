//! Unified error type for `StayLedger`.
//!
//! Every fallible operation in the crate returns [`Result`]. Domain failures carry
//! structured fields so the bot layer (and tests) can match on them directly.

use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Error surfaced by the database layer
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A string did not name a known variant (billing cycle, metric, status)
    #[error("Invalid {field}: '{value}'")]
    InvalidValue {
        /// Which kind of value was being parsed
        field: &'static str,
        /// The rejected input
        value: String,
    },

    /// Monetary amount is negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Points amount is zero or negative
    #[error("Invalid points amount: {points} (must be greater than zero)")]
    InvalidPoints {
        /// The rejected points value
        points: i64,
    },

    /// Date range ends before it starts
    #[error("Invalid date range: {start} to {end}")]
    InvalidDateRange {
        /// First day of the range
        start: NaiveDate,
        /// Last day of the range
        end: NaiveDate,
    },

    /// No subscription plan with that name or id
    #[error("Plan not found: {name}")]
    PlanNotFound {
        /// Plan name or id
        name: String,
    },

    /// Organization has no live subscription
    #[error("No active subscription for organization '{organization_id}'")]
    SubscriptionNotFound {
        /// Organization that was looked up
        organization_id: String,
    },

    /// Organization already has a live subscription
    #[error("Organization '{organization_id}' already has an active subscription")]
    SubscriptionAlreadyActive {
        /// Organization that was looked up
        organization_id: String,
    },

    /// Plan quota for a usage metric is exhausted
    #[error("Plan limit reached for {metric}: {current} of {limit}")]
    PlanLimitReached {
        /// Metric name
        metric: String,
        /// Current counter value
        current: i64,
        /// Plan limit
        limit: i64,
    },

    /// Loyalty customer does not exist
    #[error("Loyalty customer not found: {customer_id}")]
    CustomerNotFound {
        /// Requested customer id
        customer_id: i64,
    },

    /// Redeem would drive the points balance negative
    #[error("Insufficient points: balance is {balance}, requested {requested}")]
    InsufficientPoints {
        /// Balance at the time of the attempt
        balance: i64,
        /// Points requested
        requested: i64,
    },

    /// Reservation does not exist
    #[error("Reservation not found: {reservation_id}")]
    ReservationNotFound {
        /// Requested reservation id
        reservation_id: i64,
    },

    /// Room does not exist, is inactive, or belongs to another organization
    #[error("Room not found: {room_id}")]
    RoomNotFound {
        /// Requested room id
        room_id: i64,
    },

    /// Reservation status does not allow the requested action
    #[error("Cannot {action} a reservation with status '{status}'")]
    InvalidStatusTransition {
        /// Attempted action (e.g. "check in")
        action: &'static str,
        /// Current status
        status: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Failure while building a text response
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Integer conversion overflow
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    /// Error from the Discord framework
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
