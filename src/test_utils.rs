//! Shared test utilities for `StayLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating plans, subscriptions, reservations and loyalty customers with
//! sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::plans::PlanConfig,
    core::{
        billing::BillingCycle,
        loyalty, plan,
        reservation::{self, NewReservation, ReservationStatus},
        subscription,
    },
    entities::{
        loyalty_customer, organization_subscription, reservation as reservation_entity,
        subscription_plan,
    },
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Parses a `YYYY-MM-DD` literal.
pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Builds an unsaved plan model for pure pricing tests.
///
/// # Defaults
/// * `name`: "Test Plan"
/// * quotas: unlimited
/// * `features`: empty
pub fn plan_model(price_monthly: f64, price_yearly: Option<f64>) -> subscription_plan::Model {
    subscription_plan::Model {
        id: 1,
        name: "Test Plan".to_string(),
        description: None,
        price_monthly,
        price_yearly,
        max_rooms: None,
        max_users: None,
        features: String::new(),
        is_active: true,
    }
}

/// Builds a plan config entry with unlimited quotas and no features.
pub fn plan_config(name: &str, price_monthly: f64, price_yearly: Option<f64>) -> PlanConfig {
    PlanConfig {
        name: name.to_string(),
        description: None,
        price_monthly,
        price_yearly,
        max_rooms: None,
        max_users: None,
        features: Vec::new(),
    }
}

/// Creates a plan priced at 49/month with the given quotas.
pub async fn create_limited_plan(
    db: &DatabaseConnection,
    name: &str,
    max_rooms: Option<i64>,
    max_users: Option<i64>,
) -> Result<subscription_plan::Model> {
    let mut config = plan_config(name, 49.0, None);
    config.max_rooms = max_rooms;
    config.max_users = max_users;
    plan::create_plan(db, &config).await
}

/// Subscribes an organization starting today.
pub async fn subscribe(
    db: &DatabaseConnection,
    organization_id: &str,
    plan_id: i64,
    cycle: BillingCycle,
) -> Result<organization_subscription::Model> {
    let today = Utc::now().date_naive();
    subscription::create_subscription(db, organization_id, plan_id, cycle, today).await
}

/// Builds a direct booking for "Test Guest".
pub fn new_reservation(
    organization_id: &str,
    arrival: &str,
    departure: &str,
    rate_total: f64,
) -> NewReservation {
    NewReservation {
        organization_id: organization_id.to_string(),
        guest_name: "Test Guest".to_string(),
        date_arrival: date(arrival),
        date_departure: date(departure),
        rate_total,
        source: "direct".to_string(),
    }
}

/// Forces a reservation into `status`, bypassing the lifecycle checks.
pub async fn set_reservation_status(
    db: &DatabaseConnection,
    reservation_id: i64,
    status: ReservationStatus,
) -> Result<reservation_entity::Model> {
    let existing = reservation::get_reservation_by_id(db, reservation_id).await?;
    let mut active: reservation_entity::ActiveModel = existing.into();
    active.status = Set(status.as_str().to_string());
    active.update(db).await.map_err(Into::into)
}

/// Sets up a test database with one loyalty customer in organization "org".
/// Returns (db, customer) for ledger tests.
pub async fn setup_with_customer() -> Result<(DatabaseConnection, loyalty_customer::Model)> {
    let db = setup_test_db().await?;
    let customer = loyalty::create_customer(&db, "org", "Test Customer", None).await?;
    Ok((db, customer))
}
