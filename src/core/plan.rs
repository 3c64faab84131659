//! Plan catalog business logic - Seeding and lookups of subscription plans.

use crate::{
    config::plans::PlanConfig,
    entities::{SubscriptionPlan, subscription_plan},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Retrieves all plans that can still be subscribed to, cheapest first.
pub async fn get_all_active_plans(db: &DatabaseConnection) -> Result<Vec<subscription_plan::Model>> {
    SubscriptionPlan::find()
        .filter(subscription_plan::Column::IsActive.eq(true))
        .order_by_asc(subscription_plan::Column::PriceMonthly)
        .order_by_asc(subscription_plan::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a plan by its exact name.
pub async fn get_plan_by_name<C>(db: &C, name: &str) -> Result<Option<subscription_plan::Model>>
where
    C: ConnectionTrait,
{
    SubscriptionPlan::find()
        .filter(subscription_plan::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a plan by id.
pub async fn get_plan_by_id<C>(db: &C, plan_id: i64) -> Result<Option<subscription_plan::Model>>
where
    C: ConnectionTrait,
{
    SubscriptionPlan::find_by_id(plan_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a plan after validating prices and quotas.
pub async fn create_plan(
    db: &DatabaseConnection,
    config: &PlanConfig,
) -> Result<subscription_plan::Model> {
    let name = config.name.trim();
    if name.is_empty() {
        return Err(Error::Config {
            message: "Plan name cannot be empty".to_string(),
        });
    }

    for price in std::iter::once(config.price_monthly).chain(config.price_yearly) {
        if price < 0.0 || !price.is_finite() {
            return Err(Error::InvalidAmount { amount: price });
        }
    }

    if config.max_rooms.is_some_and(|limit| limit < 0)
        || config.max_users.is_some_and(|limit| limit < 0)
    {
        return Err(Error::Config {
            message: format!("Plan '{name}' has a negative quota"),
        });
    }

    let plan = subscription_plan::ActiveModel {
        name: Set(name.to_string()),
        description: Set(config.description.clone()),
        price_monthly: Set(config.price_monthly),
        price_yearly: Set(config.price_yearly),
        max_rooms: Set(config.max_rooms),
        max_users: Set(config.max_users),
        features: Set(config.features.join(",")),
        is_active: Set(true),
        ..Default::default()
    };

    plan.insert(db).await.map_err(Into::into)
}

/// Inserts every configured plan that does not exist yet (matched by name).
///
/// Returns the number of plans created.
#[instrument(skip(db, plans), fields(configured = plans.len()))]
pub async fn seed_plans(db: &DatabaseConnection, plans: &[PlanConfig]) -> Result<usize> {
    let mut created = 0;

    for config in plans {
        if get_plan_by_name(db, config.name.trim()).await?.is_some() {
            continue;
        }
        create_plan(db, config).await?;
        created += 1;
    }

    info!("Seeded {} new subscription plans", created);
    Ok(created)
}
