//! Database configuration module for `StayLedger`.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Creation is idempotent (`IF NOT EXISTS`),
//! which lets the binary call it on every start.

use crate::entities::{
    LoyaltyCustomer, LoyaltyTransaction, OrganizationSubscription, Reservation, Room,
    SubscriptionPlan, UsageMetric, usage_metric,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/stayledger.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, or the
/// default local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(parent) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(parent)?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// One usage counter per organization and metric; increments upsert on it.
async fn create_usage_metric_index(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let statement = Index::create()
        .name("idx_usage_metrics_organization_metric")
        .table(UsageMetric)
        .col(usage_metric::Column::OrganizationId)
        .col(usage_metric::Column::Metric)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Parents are created before children so foreign keys resolve on backends
/// that check them at creation time.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, SubscriptionPlan).await?;
    create_table(db, &schema, OrganizationSubscription).await?;
    create_table(db, &schema, UsageMetric).await?;
    create_usage_metric_index(db).await?;
    create_table(db, &schema, Room).await?;
    create_table(db, &schema, Reservation).await?;
    create_table(db, &schema, LoyaltyCustomer).await?;
    create_table(db, &schema, LoyaltyTransaction).await?;

    info!("Database tables are in place");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        LoyaltyCustomerModel, LoyaltyTransactionModel, OrganizationSubscriptionModel,
        ReservationModel, RoomModel, SubscriptionPlanModel, UsageMetricModel,
    };
    use sea_orm::QuerySelect;

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite://data/stayledger.sqlite?mode=rwc"),
            Some(Path::new("data"))
        );
        assert_eq!(sqlite_parent_dir("sqlite://local.sqlite"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_parent_dir("postgres://localhost/stayledger"), None);
    }

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<SubscriptionPlanModel> = SubscriptionPlan::find().limit(1).all(&db).await?;
        let _: Vec<OrganizationSubscriptionModel> =
            OrganizationSubscription::find().limit(1).all(&db).await?;
        let _: Vec<UsageMetricModel> = UsageMetric::find().limit(1).all(&db).await?;
        let _: Vec<RoomModel> = Room::find().limit(1).all(&db).await?;
        let _: Vec<ReservationModel> = Reservation::find().limit(1).all(&db).await?;
        let _: Vec<LoyaltyCustomerModel> = LoyaltyCustomer::find().limit(1).all(&db).await?;
        let _: Vec<LoyaltyTransactionModel> =
            LoyaltyTransaction::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<RoomModel> = Room::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_default_database_url_is_sqlite() {
        if std::env::var("DATABASE_URL").is_err() {
            assert!(get_database_url().starts_with("sqlite://"));
        }
    }
}
