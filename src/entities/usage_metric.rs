//! Usage metric entity - Per-organization consumption counters.
//!
//! One row per (`organization_id`, `metric`), enforced by a unique index built
//! alongside the table. Counters only grow within a billing period; flow
//! metrics are zeroed when the period rolls over.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Usage counter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_metrics")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant being metered
    pub organization_id: String,
    /// `"rooms"`, `"users"`, `"transactions"` or `"api_calls"`
    pub metric: String,
    /// Current counter value
    pub current_value: i64,
    /// Start of the billing period the value belongs to
    pub period_start: Date,
    /// Last time the counter changed
    pub updated_at: DateTimeUtc,
}

/// `UsageMetric` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
