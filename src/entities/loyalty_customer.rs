//! Loyalty customer entity - Holds the running points balance.
//!
//! `points_balance` is never negative; it is only changed through
//! [`crate::core::loyalty`], which appends a ledger entry for every change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Loyalty customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loyalty_customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant the programme belongs to
    pub organization_id: String,
    /// Display name
    pub name: String,
    /// Optional contact email
    pub email: Option<String>,
    /// Points currently available to redeem
    pub points_balance: i64,
    /// All points ever awarded, used for tiering
    pub lifetime_points: i64,
    /// When the customer enrolled
    pub created_at: DateTimeUtc,
    /// Last balance change
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between customers and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many ledger entries
    #[sea_orm(has_many = "super::loyalty_transaction::Entity")]
    Transactions,
}

impl Related<super::loyalty_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
