//! Subscription plan entity - Reference pricing and quota data.
//!
//! Plans are seeded from `config.toml` and treated as immutable afterwards.
//! A `None` quota means the plan is unlimited for that resource.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription plan database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_plans")]
pub struct Model {
    /// Unique identifier for the plan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plan name shown to customers (e.g., "Starter", "Business")
    #[sea_orm(unique)]
    pub name: String,
    /// Optional marketing description
    pub description: Option<String>,
    /// Price charged per month on the monthly cycle
    pub price_monthly: f64,
    /// Price charged per year on the yearly cycle, `None` falls back to 12 × monthly
    pub price_yearly: Option<f64>,
    /// Maximum number of rooms, `None` for unlimited
    pub max_rooms: Option<i64>,
    /// Maximum number of staff users, `None` for unlimited
    pub max_users: Option<i64>,
    /// Comma separated feature flags
    pub features: String,
    /// Whether the plan can still be subscribed to
    pub is_active: bool,
}

/// Defines relationships between plans and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One plan backs many organization subscriptions
    #[sea_orm(has_many = "super::organization_subscription::Entity")]
    Subscriptions,
}

impl Related<super::organization_subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Returns the feature flags as a list, skipping empty entries.
    #[must_use]
    pub fn feature_list(&self) -> Vec<&str> {
        self.features
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect()
    }
}
