//! Loyalty ledger - Award and redeem points with a non-negative balance.
//!
//! Every balance change runs in one database transaction that updates the
//! running balance with a single atomic expression and appends a ledger entry.
//! Redeem adds `WHERE points_balance >= points` to its update, so two
//! concurrent redeems can never both spend the same points: the loser sees zero
//! affected rows and fails with [`Error::InsufficientPoints`].

use crate::{
    entities::{LoyaltyCustomer, LoyaltyTransaction, loyalty_customer, loyalty_transaction},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Ledger entry kind for points added
pub const AWARD: &str = "award";
/// Ledger entry kind for points spent
pub const REDEEM: &str = "redeem";

/// Programme tier derived from lifetime points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LoyaltyTier {
    /// Below 1 000 lifetime points
    Bronze,
    /// 1 000 to 4 999
    Silver,
    /// 5 000 to 14 999
    Gold,
    /// 15 000 and above
    Platinum,
}

impl LoyaltyTier {
    /// Display name of the tier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

/// Returns the tier earned by `lifetime_points`.
#[must_use]
pub const fn loyalty_tier(lifetime_points: i64) -> LoyaltyTier {
    match lifetime_points {
        i64::MIN..1_000 => LoyaltyTier::Bronze,
        1_000..5_000 => LoyaltyTier::Silver,
        5_000..15_000 => LoyaltyTier::Gold,
        _ => LoyaltyTier::Platinum,
    }
}

fn validate_points(points: i64) -> Result<()> {
    if points <= 0 {
        return Err(Error::InvalidPoints { points });
    }
    Ok(())
}

/// Enrolls a customer with an empty balance.
pub async fn create_customer(
    db: &DatabaseConnection,
    organization_id: &str,
    name: &str,
    email: Option<String>,
) -> Result<loyalty_customer::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Customer name cannot be empty".to_string(),
        });
    }

    let now = Utc::now();
    let customer = loyalty_customer::ActiveModel {
        organization_id: Set(organization_id.to_string()),
        name: Set(name.to_string()),
        email: Set(email),
        points_balance: Set(0),
        lifetime_points: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    customer.insert(db).await.map_err(Into::into)
}

/// Finds one of an organization's customers by id.
///
/// A customer enrolled by another organization is reported as
/// [`Error::CustomerNotFound`].
pub async fn get_customer<C>(
    db: &C,
    organization_id: &str,
    customer_id: i64,
) -> Result<loyalty_customer::Model>
where
    C: ConnectionTrait,
{
    LoyaltyCustomer::find_by_id(customer_id)
        .filter(loyalty_customer::Column::OrganizationId.eq(organization_id))
        .one(db)
        .await?
        .ok_or(Error::CustomerNotFound { customer_id })
}

/// Lists an organization's customers, highest balance first.
pub async fn list_customers(
    db: &DatabaseConnection,
    organization_id: &str,
) -> Result<Vec<loyalty_customer::Model>> {
    LoyaltyCustomer::find()
        .filter(loyalty_customer::Column::OrganizationId.eq(organization_id))
        .order_by_desc(loyalty_customer::Column::PointsBalance)
        .order_by_asc(loyalty_customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns a customer's ledger, newest entry first.
pub async fn get_ledger(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Vec<loyalty_transaction::Model>> {
    LoyaltyTransaction::find()
        .filter(loyalty_transaction::Column::CustomerId.eq(customer_id))
        .order_by_desc(loyalty_transaction::Column::Timestamp)
        .order_by_desc(loyalty_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn append_entry<C>(
    db: &C,
    customer_id: i64,
    points: i64,
    transaction_type: &str,
    reason: String,
    balance_after: i64,
) -> Result<loyalty_transaction::Model>
where
    C: ConnectionTrait,
{
    let entry = loyalty_transaction::ActiveModel {
        customer_id: Set(customer_id),
        points: Set(points),
        transaction_type: Set(transaction_type.to_string()),
        reason: Set(reason),
        balance_after: Set(balance_after),
        timestamp: Set(Utc::now()),
        ..Default::default()
    };

    entry.insert(db).await.map_err(Into::into)
}

/// Adds `points` to a customer's balance and lifetime total.
#[instrument(skip(db, reason))]
pub async fn award_points(
    db: &DatabaseConnection,
    organization_id: &str,
    customer_id: i64,
    points: i64,
    reason: String,
) -> Result<loyalty_transaction::Model> {
    validate_points(points)?;

    let txn = db.begin().await?;
    get_customer(&txn, organization_id, customer_id).await?;

    LoyaltyCustomer::update_many()
        .col_expr(
            loyalty_customer::Column::PointsBalance,
            Expr::col(loyalty_customer::Column::PointsBalance).add(points),
        )
        .col_expr(
            loyalty_customer::Column::LifetimePoints,
            Expr::col(loyalty_customer::Column::LifetimePoints).add(points),
        )
        .col_expr(loyalty_customer::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(loyalty_customer::Column::Id.eq(customer_id))
        .exec(&txn)
        .await?;

    let updated = get_customer(&txn, organization_id, customer_id).await?;
    let entry = append_entry(
        &txn,
        customer_id,
        points,
        AWARD,
        reason,
        updated.points_balance,
    )
    .await?;

    txn.commit().await?;

    info!(
        "Awarded {} points to customer {} (balance {})",
        points, customer_id, updated.points_balance
    );
    Ok(entry)
}

/// Spends `points` from a customer's balance.
///
/// Fails with [`Error::InsufficientPoints`] when the balance is too small; the
/// balance is left untouched in that case.
#[instrument(skip(db, reason))]
pub async fn redeem_points(
    db: &DatabaseConnection,
    organization_id: &str,
    customer_id: i64,
    points: i64,
    reason: String,
) -> Result<loyalty_transaction::Model> {
    validate_points(points)?;

    let txn = db.begin().await?;
    let customer = get_customer(&txn, organization_id, customer_id).await?;

    // Reject before touching the balance
    if points > customer.points_balance {
        return Err(Error::InsufficientPoints {
            balance: customer.points_balance,
            requested: points,
        });
    }

    let result = LoyaltyCustomer::update_many()
        .col_expr(
            loyalty_customer::Column::PointsBalance,
            Expr::col(loyalty_customer::Column::PointsBalance).sub(points),
        )
        .col_expr(loyalty_customer::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(loyalty_customer::Column::Id.eq(customer_id))
        .filter(loyalty_customer::Column::PointsBalance.gte(points))
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        let current = get_customer(&txn, organization_id, customer_id).await?;
        warn!(
            "Redeem of {} points for customer {} lost a race (balance now {})",
            points, customer_id, current.points_balance
        );
        return Err(Error::InsufficientPoints {
            balance: current.points_balance,
            requested: points,
        });
    }

    let updated = get_customer(&txn, organization_id, customer_id).await?;
    let entry = append_entry(
        &txn,
        customer_id,
        -points,
        REDEEM,
        reason,
        updated.points_balance,
    )
    .await?;

    txn.commit().await?;

    info!(
        "Redeemed {} points for customer {} (balance {})",
        points, customer_id, updated.points_balance
    );
    Ok(entry)
}
