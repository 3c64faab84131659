//! Loyalty transaction entity - Append-only points ledger.
//!
//! Each entry records the signed `points` delta, the `transaction_type`
//! (`"award"` or `"redeem"`), a free-form reason and the `balance_after` the change.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loyalty_transactions")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer whose balance changed
    pub customer_id: i64,
    /// Signed delta (positive for award, negative for redeem)
    pub points: i64,
    /// `"award"` or `"redeem"`
    pub transaction_type: String,
    /// Why the points moved (e.g., "Stay #42")
    pub reason: String,
    /// Balance right after this entry was applied
    pub balance_after: i64,
    /// When the entry was written
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between ledger entries and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one customer
    #[sea_orm(
        belongs_to = "super::loyalty_customer::Entity",
        from = "Column::CustomerId",
        to = "super::loyalty_customer::Column::Id"
    )]
    Customer,
}

impl Related<super::loyalty_customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
