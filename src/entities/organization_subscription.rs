//! Organization subscription entity - Links an organization to a plan.
//!
//! `billing_cycle` and `status` are stored as their string forms; see
//! [`crate::core::billing::BillingCycle`] and
//! [`crate::core::subscription::SubscriptionStatus`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Organization subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organization_subscriptions")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Tenant that owns the subscription
    pub organization_id: String,
    /// Plan being paid for
    pub plan_id: i64,
    /// `"monthly"` or `"yearly"`
    pub billing_cycle: String,
    /// `"active"`, `"trialing"`, `"past_due"` or `"cancelled"`
    pub status: String,
    /// First day of the current billing period
    pub current_period_start: Date,
    /// First day after the current billing period
    pub current_period_end: Date,
    /// Day the first billing period began; periods start on its day of month
    pub billing_anchor: Date,
    /// When the subscription was created
    pub created_at: DateTimeUtc,
    /// When the subscription was cancelled, if it was
    pub cancelled_at: Option<DateTimeUtc>,
}

/// Defines relationships between subscriptions and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subscription belongs to one plan
    #[sea_orm(
        belongs_to = "super::subscription_plan::Entity",
        from = "Column::PlanId",
        to = "super::subscription_plan::Column::Id"
    )]
    Plan,
}

impl Related<super::subscription_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
