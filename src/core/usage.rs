//! Usage metering - Consumption counters checked against plan quotas.
//!
//! Counters live in the `usage_metrics` table, one row per organization and
//! metric. Increments are single `INSERT ... ON CONFLICT DO UPDATE SET
//! current_value = current_value + n` statements so concurrent writers never
//! lose an update or create a second row. Flow metrics
//! (transactions, API calls) are zeroed at billing-period rollover; stock
//! metrics (rooms, users) describe standing resources and carry over.

use crate::{
    entities::{UsageMetric, subscription_plan, usage_metric},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use tracing::{debug, instrument};

/// A resource counted against a plan quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Rooms configured for the property
    Rooms,
    /// Staff users with access
    Users,
    /// Reservations and sales recorded this period
    Transactions,
    /// API calls made this period
    ApiCalls,
}

impl Metric {
    /// Every metric, in display order
    pub const ALL: [Self; 4] = [Self::Rooms, Self::Users, Self::Transactions, Self::ApiCalls];

    /// Storage form of the metric
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rooms => "rooms",
            Self::Users => "users",
            Self::Transactions => "transactions",
            Self::ApiCalls => "api_calls",
        }
    }

    /// Parses the storage form, case-insensitively.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "rooms" => Ok(Self::Rooms),
            "users" => Ok(Self::Users),
            "transactions" => Ok(Self::Transactions),
            "api_calls" => Ok(Self::ApiCalls),
            _ => Err(Error::InvalidValue {
                field: "usage metric",
                value: value.to_string(),
            }),
        }
    }

    /// Whether the counter starts from zero every billing period
    #[must_use]
    pub const fn resets_each_period(self) -> bool {
        matches!(self, Self::Transactions | Self::ApiCalls)
    }
}

/// A metric's current value next to its plan limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStatus {
    /// The metric being reported
    pub metric: Metric,
    /// Current counter value
    pub current: i64,
    /// Plan limit, `None` for unlimited
    pub limit: Option<i64>,
    /// Whether `current` has reached `limit`
    pub limit_reached: bool,
}

impl UsageStatus {
    fn new(metric: Metric, current: i64, limit: Option<i64>) -> Self {
        Self {
            metric,
            current,
            limit,
            limit_reached: is_limit_reached(current, limit),
        }
    }
}

/// Returns true when `current` has reached `limit`.
///
/// A `None` limit is unlimited and never reached. A limit of zero is always
/// reached.
#[must_use]
pub const fn is_limit_reached(current: i64, limit: Option<i64>) -> bool {
    match limit {
        Some(limit) => current >= limit,
        None => false,
    }
}

/// Returns the quota `plan` sets for `metric`, `None` for unlimited.
#[must_use]
pub const fn plan_limit(plan: &subscription_plan::Model, metric: Metric) -> Option<i64> {
    match metric {
        Metric::Rooms => plan.max_rooms,
        Metric::Users => plan.max_users,
        Metric::Transactions | Metric::ApiCalls => None,
    }
}

async fn find_counter<C>(
    db: &C,
    organization_id: &str,
    metric: Metric,
) -> Result<Option<usage_metric::Model>>
where
    C: ConnectionTrait,
{
    UsageMetric::find()
        .filter(usage_metric::Column::OrganizationId.eq(organization_id))
        .filter(usage_metric::Column::Metric.eq(metric.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Reads the current value of one counter, 0 if it was never tracked.
pub async fn get_metric_value<C>(db: &C, organization_id: &str, metric: Metric) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(find_counter(db, organization_id, metric)
        .await?
        .map_or(0, |counter| counter.current_value))
}

/// Atomically adds `delta` to a counter, creating the row on first use.
///
/// Meant to run inside a caller's database transaction; see [`track_usage`] for
/// the standalone version.
pub async fn increment_usage<C>(
    db: &C,
    organization_id: &str,
    metric: Metric,
    delta: i64,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    if delta <= 0 {
        return Err(Error::InvalidValue {
            field: "usage delta",
            value: delta.to_string(),
        });
    }

    let now = Utc::now();
    let counter = usage_metric::ActiveModel {
        organization_id: Set(organization_id.to_string()),
        metric: Set(metric.as_str().to_string()),
        current_value: Set(delta),
        period_start: Set(now.date_naive()),
        updated_at: Set(now),
        ..Default::default()
    };

    // First use inserts; every later call, or a writer that lost the insert
    // race, lands on the (organization_id, metric) unique index and adds.
    UsageMetric::insert(counter)
        .on_conflict(
            OnConflict::columns([
                usage_metric::Column::OrganizationId,
                usage_metric::Column::Metric,
            ])
            .value(
                usage_metric::Column::CurrentValue,
                Expr::col(usage_metric::Column::CurrentValue).add(delta),
            )
            .value(usage_metric::Column::UpdatedAt, Expr::value(now))
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    get_metric_value(db, organization_id, metric).await
}

/// Records `delta` units of usage and returns the new counter value.
#[instrument(skip(db))]
pub async fn track_usage(
    db: &DatabaseConnection,
    organization_id: &str,
    metric: Metric,
    delta: i64,
) -> Result<i64> {
    let txn = db.begin().await?;
    let value = increment_usage(&txn, organization_id, metric, delta).await?;
    txn.commit().await?;

    debug!("{} usage for {} is now {}", metric.as_str(), organization_id, value);
    Ok(value)
}

/// Returns every tracked counter for an organization.
pub async fn get_usage(
    db: &DatabaseConnection,
    organization_id: &str,
) -> Result<Vec<usage_metric::Model>> {
    UsageMetric::find()
        .filter(usage_metric::Column::OrganizationId.eq(organization_id))
        .all(db)
        .await
        .map_err(Into::into)
}

async fn active_plan<C>(db: &C, organization_id: &str) -> Result<Option<subscription_plan::Model>>
where
    C: ConnectionTrait,
{
    let Some(subscription) =
        crate::core::subscription::find_live_subscription(db, organization_id).await?
    else {
        return Ok(None);
    };

    crate::core::plan::get_plan_by_id(db, subscription.plan_id).await
}

/// Compares one counter against the organization's plan.
///
/// Organizations without a live subscription are unmetered and report no limit.
pub async fn check_limit<C>(db: &C, organization_id: &str, metric: Metric) -> Result<UsageStatus>
where
    C: ConnectionTrait,
{
    let plan = active_plan(db, organization_id).await?;
    let limit = plan.as_ref().and_then(|plan| plan_limit(plan, metric));
    let current = get_metric_value(db, organization_id, metric).await?;
    Ok(UsageStatus::new(metric, current, limit))
}

/// Fails with [`Error::PlanLimitReached`] when `metric` has no headroom left.
pub async fn ensure_within_limit<C>(db: &C, organization_id: &str, metric: Metric) -> Result<()>
where
    C: ConnectionTrait,
{
    let status = check_limit(db, organization_id, metric).await?;
    match status.limit {
        Some(limit) if status.limit_reached => Err(Error::PlanLimitReached {
            metric: metric.as_str().to_string(),
            current: status.current,
            limit,
        }),
        _ => Ok(()),
    }
}

/// Reports every metric against the organization's plan.
pub async fn usage_summary(
    db: &DatabaseConnection,
    organization_id: &str,
) -> Result<Vec<UsageStatus>> {
    let plan = active_plan(db, organization_id).await?;
    let counters = get_usage(db, organization_id).await?;

    Ok(Metric::ALL
        .into_iter()
        .map(|metric| {
            let current = counters
                .iter()
                .find(|counter| counter.metric == metric.as_str())
                .map_or(0, |counter| counter.current_value);
            let limit = plan.as_ref().and_then(|plan| plan_limit(plan, metric));
            UsageStatus::new(metric, current, limit)
        })
        .collect())
}

/// Starts a new billing period: zeroes flow metrics and stamps `period_start`
/// on every counter of the organization.
pub async fn reset_period_counters<C>(
    db: &C,
    organization_id: &str,
    period_start: NaiveDate,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let flow_metrics: Vec<&str> = Metric::ALL
        .into_iter()
        .filter(|metric| metric.resets_each_period())
        .map(Metric::as_str)
        .collect();
    let now = Utc::now();

    UsageMetric::update_many()
        .col_expr(usage_metric::Column::CurrentValue, Expr::value(0_i64))
        .col_expr(usage_metric::Column::UpdatedAt, Expr::value(now))
        .filter(usage_metric::Column::OrganizationId.eq(organization_id))
        .filter(usage_metric::Column::Metric.is_in(flow_metrics))
        .exec(db)
        .await?;

    UsageMetric::update_many()
        .col_expr(usage_metric::Column::PeriodStart, Expr::value(period_start))
        .filter(usage_metric::Column::OrganizationId.eq(organization_id))
        .exec(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::billing::BillingCycle;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_is_limit_reached() {
        assert!(!is_limit_reached(1_000_000, None));
        assert!(!is_limit_reached(9, Some(10)));
        assert!(is_limit_reached(10, Some(10)));
        assert!(is_limit_reached(11, Some(10)));
        assert!(is_limit_reached(0, Some(0)));
        assert!(is_limit_reached(1, Some(0)));
    }

    #[test]
    fn test_plan_limit_by_metric() {
        let mut plan = plan_model(29.0, None);
        plan.max_rooms = Some(10);
        plan.max_users = Some(3);

        assert_eq!(plan_limit(&plan, Metric::Rooms), Some(10));
        assert_eq!(plan_limit(&plan, Metric::Users), Some(3));
        assert_eq!(plan_limit(&plan, Metric::Transactions), None);
        assert_eq!(plan_limit(&plan, Metric::ApiCalls), None);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!(Metric::parse("rooms").unwrap(), Metric::Rooms);
        assert_eq!(Metric::parse("API_CALLS").unwrap(), Metric::ApiCalls);
        assert!(matches!(
            Metric::parse("bananas"),
            Err(Error::InvalidValue { field: "usage metric", .. })
        ));
        assert!(Metric::Transactions.resets_each_period());
        assert!(!Metric::Rooms.resets_each_period());
    }

    #[tokio::test]
    async fn test_track_usage_rejects_non_positive_delta() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = track_usage(&db, "org", Metric::ApiCalls, 0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidValue { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_track_usage_accumulates() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(track_usage(&db, "org-a", Metric::ApiCalls, 5).await?, 5);
        assert_eq!(track_usage(&db, "org-a", Metric::ApiCalls, 3).await?, 8);
        assert_eq!(track_usage(&db, "org-b", Metric::ApiCalls, 1).await?, 1);

        assert_eq!(get_metric_value(&db, "org-a", Metric::ApiCalls).await?, 8);
        assert_eq!(get_metric_value(&db, "org-a", Metric::Users).await?, 0);
        assert_eq!(get_usage(&db, "org-a").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_counter_row_is_unique_per_metric() -> Result<()> {
        let db = setup_test_db().await?;
        track_usage(&db, "org", Metric::Transactions, 1).await?;

        let duplicate = usage_metric::ActiveModel {
            organization_id: Set("org".to_string()),
            metric: Set(Metric::Transactions.as_str().to_string()),
            current_value: Set(99),
            period_start: Set(Utc::now().date_naive()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        assert!(duplicate.insert(&db).await.is_err());
        assert_eq!(get_metric_value(&db, "org", Metric::Transactions).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_first_increments_share_one_row() -> Result<()> {
        let db = setup_test_db().await?;

        let (a, b, c) = tokio::try_join!(
            track_usage(&db, "org", Metric::ApiCalls, 1),
            track_usage(&db, "org", Metric::ApiCalls, 2),
            track_usage(&db, "org", Metric::ApiCalls, 4),
        )?;
        assert!([a, b, c].contains(&7));

        let counters = get_usage(&db, "org").await?;
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].current_value, 7);

        Ok(())
    }

    #[tokio::test]
    async fn test_check_limit_against_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_limited_plan(&db, "Tiny", Some(2), Some(1)).await?;
        subscribe(&db, "org", plan.id, BillingCycle::Monthly).await?;

        track_usage(&db, "org", Metric::Rooms, 1).await?;
        let status = check_limit(&db, "org", Metric::Rooms).await?;
        assert_eq!(status.current, 1);
        assert_eq!(status.limit, Some(2));
        assert!(!status.limit_reached);
        ensure_within_limit(&db, "org", Metric::Rooms).await?;

        track_usage(&db, "org", Metric::Rooms, 1).await?;
        let result = ensure_within_limit(&db, "org", Metric::Rooms).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::PlanLimitReached { current: 2, limit: 2, .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_unsubscribed_organization_is_unmetered() -> Result<()> {
        let db = setup_test_db().await?;
        track_usage(&db, "free-org", Metric::Rooms, 500).await?;

        let status = check_limit(&db, "free-org", Metric::Rooms).await?;
        assert_eq!(status.limit, None);
        assert!(!status.limit_reached);

        Ok(())
    }

    #[tokio::test]
    async fn test_usage_summary_reports_every_metric() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_limited_plan(&db, "Tiny", Some(2), Some(0)).await?;
        subscribe(&db, "org", plan.id, BillingCycle::Monthly).await?;
        track_usage(&db, "org", Metric::Transactions, 7).await?;

        let summary = usage_summary(&db, "org").await?;
        assert_eq!(summary.len(), 4);
        assert_eq!(summary[0], UsageStatus::new(Metric::Rooms, 0, Some(2)));
        assert!(summary[1].limit_reached); // zero user quota
        assert_eq!(summary[2].current, 7);
        assert_eq!(summary[2].limit, None);
        assert_eq!(summary[3].current, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_period_counters_only_zeroes_flow_metrics() -> Result<()> {
        let db = setup_test_db().await?;
        track_usage(&db, "org", Metric::Rooms, 4).await?;
        track_usage(&db, "org", Metric::Transactions, 9).await?;
        track_usage(&db, "other", Metric::Transactions, 2).await?;

        let new_start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        reset_period_counters(&db, "org", new_start).await?;

        assert_eq!(get_metric_value(&db, "org", Metric::Rooms).await?, 4);
        assert_eq!(get_metric_value(&db, "org", Metric::Transactions).await?, 0);
        assert_eq!(get_metric_value(&db, "other", Metric::Transactions).await?, 2);

        let counters = get_usage(&db, "org").await?;
        assert!(counters.iter().all(|c| c.period_start == new_start));

        Ok(())
    }
}
