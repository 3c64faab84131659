//! Subscription business logic - Links organizations to plans and rolls billing periods.
//!
//! An organization has at most one live subscription (active, trialing or past
//! due). Creation checks and inserts inside one database transaction. The
//! billing period is the half-open range `[current_period_start,
//! current_period_end)`; [`process_period_rollover`] advances it and resets
//! per-period usage, the same way a month-end close would.

use crate::{
    core::{billing::BillingCycle, usage},
    entities::{OrganizationSubscription, organization_subscription},
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Paid and in good standing
    Active,
    /// In a free trial
    Trialing,
    /// Payment failed but access continues
    PastDue,
    /// Ended; no longer counts as the organization's subscription
    Cancelled,
}

impl SubscriptionStatus {
    /// Statuses that count as the organization's current subscription
    pub const LIVE: [Self; 3] = [Self::Active, Self::Trialing, Self::PastDue];

    /// Storage form of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the storage form.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "active" => Ok(Self::Active),
            "trialing" => Ok(Self::Trialing),
            "past_due" => Ok(Self::PastDue),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(Error::InvalidValue {
                field: "subscription status",
                value: value.to_string(),
            }),
        }
    }
}

/// Result of advancing a subscription's billing period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRollover {
    /// Organization that rolled over
    pub organization_id: String,
    /// Period start before the rollover
    pub previous_start: NaiveDate,
    /// New period start
    pub period_start: NaiveDate,
    /// New period end (exclusive)
    pub period_end: NaiveDate,
    /// How many whole periods were skipped forward
    pub periods_advanced: u32,
}

/// Returns the first day after a period of `cycle` starting at `start`.
///
/// Month arithmetic clamps to the end of shorter months (Jan 31 → Feb 29).
pub fn period_end_for(start: NaiveDate, cycle: BillingCycle) -> Result<NaiveDate> {
    anchored_period_end(start, cycle, start)
}

/// Returns the end of the period starting at `start`, landing on `anchor`'s
/// day of month where the month has it.
///
/// Clamping never carries over: a subscription anchored on the 31st runs
/// Jan 31 → Feb 29 → Mar 31, not Feb 29 → Mar 29.
pub fn anchored_period_end(
    start: NaiveDate,
    cycle: BillingCycle,
    anchor: NaiveDate,
) -> Result<NaiveDate> {
    let overflow = || Error::Config {
        message: format!("Billing period starting {start} overflows the calendar"),
    };

    let month = start
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(cycle.period_months())))
        .ok_or_else(overflow)?;
    let last_day = month
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(overflow)?
        .day();

    month
        .with_day(anchor.day().min(last_day))
        .ok_or_else(overflow)
}

/// Finds the organization's live subscription, if any.
pub async fn find_live_subscription<C>(
    db: &C,
    organization_id: &str,
) -> Result<Option<organization_subscription::Model>>
where
    C: ConnectionTrait,
{
    let live: Vec<&str> = SubscriptionStatus::LIVE
        .into_iter()
        .map(SubscriptionStatus::as_str)
        .collect();

    OrganizationSubscription::find()
        .filter(organization_subscription::Column::OrganizationId.eq(organization_id))
        .filter(organization_subscription::Column::Status.is_in(live))
        .order_by_desc(organization_subscription::Column::CreatedAt)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the organization's live subscription or [`Error::SubscriptionNotFound`].
pub async fn get_active_subscription<C>(
    db: &C,
    organization_id: &str,
) -> Result<organization_subscription::Model>
where
    C: ConnectionTrait,
{
    find_live_subscription(db, organization_id)
        .await?
        .ok_or_else(|| Error::SubscriptionNotFound {
            organization_id: organization_id.to_string(),
        })
}

/// Subscribes an organization to a plan, starting the first period on `today`.
#[instrument(skip(db))]
pub async fn create_subscription(
    db: &DatabaseConnection,
    organization_id: &str,
    plan_id: i64,
    cycle: BillingCycle,
    today: NaiveDate,
) -> Result<organization_subscription::Model> {
    let txn = db.begin().await?;

    let plan = crate::core::plan::get_plan_by_id(&txn, plan_id)
        .await?
        .filter(|plan| plan.is_active)
        .ok_or_else(|| Error::PlanNotFound {
            name: plan_id.to_string(),
        })?;

    if find_live_subscription(&txn, organization_id).await?.is_some() {
        return Err(Error::SubscriptionAlreadyActive {
            organization_id: organization_id.to_string(),
        });
    }

    let subscription = organization_subscription::ActiveModel {
        organization_id: Set(organization_id.to_string()),
        plan_id: Set(plan.id),
        billing_cycle: Set(cycle.as_str().to_string()),
        status: Set(SubscriptionStatus::Active.as_str().to_string()),
        current_period_start: Set(today),
        current_period_end: Set(period_end_for(today, cycle)?),
        billing_anchor: Set(today),
        created_at: Set(Utc::now()),
        cancelled_at: Set(None),
        ..Default::default()
    };

    let result = subscription.insert(&txn).await?;
    txn.commit().await?;

    info!(
        "Organization {} subscribed to plan '{}' ({})",
        organization_id,
        plan.name,
        cycle.as_str()
    );
    Ok(result)
}

/// Moves the live subscription to another plan and/or billing cycle.
///
/// The current period is kept; the new cycle applies from the next rollover.
pub async fn change_plan(
    db: &DatabaseConnection,
    organization_id: &str,
    plan_id: i64,
    cycle: BillingCycle,
) -> Result<organization_subscription::Model> {
    let txn = db.begin().await?;

    crate::core::plan::get_plan_by_id(&txn, plan_id)
        .await?
        .filter(|plan| plan.is_active)
        .ok_or_else(|| Error::PlanNotFound {
            name: plan_id.to_string(),
        })?;

    let subscription = get_active_subscription(&txn, organization_id).await?;
    let mut active_model: organization_subscription::ActiveModel = subscription.into();
    active_model.plan_id = Set(plan_id);
    active_model.billing_cycle = Set(cycle.as_str().to_string());
    let updated = active_model.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Cancels the live subscription.
pub async fn cancel_subscription(
    db: &DatabaseConnection,
    organization_id: &str,
) -> Result<organization_subscription::Model> {
    let subscription = get_active_subscription(db, organization_id).await?;

    let mut active_model: organization_subscription::ActiveModel = subscription.into();
    active_model.status = Set(SubscriptionStatus::Cancelled.as_str().to_string());
    active_model.cancelled_at = Set(Some(Utc::now()));
    active_model.update(db).await.map_err(Into::into)
}

/// Advances the billing period when `today` has reached its end.
///
/// The period moves forward by whole cycles until it contains `today`, and the
/// organization's per-period usage counters are reset, all in one transaction.
///
/// # Returns
/// * `Ok(Some(result))` - The period was advanced
/// * `Ok(None)` - The current period is still running
#[instrument(skip(db))]
pub async fn process_period_rollover(
    db: &DatabaseConnection,
    organization_id: &str,
    today: NaiveDate,
) -> Result<Option<PeriodRollover>> {
    let txn = db.begin().await?;
    let subscription = get_active_subscription(&txn, organization_id).await?;

    if today < subscription.current_period_end {
        return Ok(None);
    }

    let cycle = BillingCycle::parse(&subscription.billing_cycle)?;
    let previous_start = subscription.current_period_start;
    let mut period_start = subscription.current_period_end;
    let anchor = subscription.billing_anchor;
    let mut period_end = anchored_period_end(period_start, cycle, anchor)?;
    let mut periods_advanced = 1;

    while today >= period_end {
        period_start = period_end;
        period_end = anchored_period_end(period_start, cycle, anchor)?;
        periods_advanced += 1;
    }

    let mut active_model: organization_subscription::ActiveModel = subscription.into();
    active_model.current_period_start = Set(period_start);
    active_model.current_period_end = Set(period_end);
    active_model.update(&txn).await?;

    usage::reset_period_counters(&txn, organization_id, period_start).await?;

    txn.commit().await?;

    Ok(Some(PeriodRollover {
        organization_id: organization_id.to_string(),
        previous_start,
        period_start,
        period_end,
        periods_advanced,
    }))
}

/// Formats a rollover into a one-line log/chat summary.
#[must_use]
pub fn format_rollover_summary(rollover: &PeriodRollover) -> String {
    let mut summary = format!(
        "Billing period for {} rolled over: {} → {}",
        rollover.organization_id, rollover.previous_start, rollover.period_start
    );
    if rollover.periods_advanced > 1 {
        summary.push_str(&format!(" ({} periods)", rollover.periods_advanced));
    }
    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::usage::{Metric, get_metric_value, track_usage};
    use crate::test_utils::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_end_for() {
        assert_eq!(
            period_end_for(date(2024, 1, 15), BillingCycle::Monthly).unwrap(),
            date(2024, 2, 15)
        );
        assert_eq!(
            period_end_for(date(2024, 1, 31), BillingCycle::Monthly).unwrap(),
            date(2024, 2, 29)
        );
        assert_eq!(
            period_end_for(date(2024, 3, 1), BillingCycle::Yearly).unwrap(),
            date(2025, 3, 1)
        );
    }

    #[test]
    fn test_anchored_period_end_restores_anchor_day() {
        let anchor = date(2024, 1, 31);
        let cycle = BillingCycle::Monthly;
        assert_eq!(anchored_period_end(anchor, cycle, anchor).unwrap(), date(2024, 2, 29));
        assert_eq!(
            anchored_period_end(date(2024, 2, 29), cycle, anchor).unwrap(),
            date(2024, 3, 31)
        );
        assert_eq!(
            anchored_period_end(date(2024, 3, 31), cycle, anchor).unwrap(),
            date(2024, 4, 30)
        );
        assert_eq!(
            anchored_period_end(date(2024, 2, 29), BillingCycle::Yearly, date(2024, 2, 29))
                .unwrap(),
            date(2025, 2, 28)
        );
        assert_eq!(
            anchored_period_end(date(2025, 2, 28), BillingCycle::Yearly, date(2024, 2, 29))
                .unwrap(),
            date(2026, 2, 28)
        );
    }

    #[test]
    fn test_status_round_trip_and_rejects_unknown() {
        for status in SubscriptionStatus::LIVE {
            assert_eq!(SubscriptionStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(SubscriptionStatus::parse("paused").is_err());
    }

    #[tokio::test]
    async fn test_create_subscription_sets_period() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_limited_plan(&db, "Starter", Some(10), None).await?;

        let subscription =
            create_subscription(&db, "org", plan.id, BillingCycle::Yearly, date(2024, 5, 10))
                .await?;

        assert_eq!(subscription.status, "active");
        assert_eq!(subscription.billing_cycle, "yearly");
        assert_eq!(subscription.current_period_start, date(2024, 5, 10));
        assert_eq!(subscription.current_period_end, date(2025, 5, 10));

        let found = get_active_subscription(&db, "org").await?;
        assert_eq!(found, subscription);
        Ok(())
    }

    #[tokio::test]
    async fn test_one_live_subscription_per_organization() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_limited_plan(&db, "Starter", Some(10), None).await?;

        create_subscription(&db, "org", plan.id, BillingCycle::Monthly, date(2024, 1, 1)).await?;
        let result =
            create_subscription(&db, "org", plan.id, BillingCycle::Monthly, date(2024, 1, 2)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::SubscriptionAlreadyActive { .. }
        ));

        cancel_subscription(&db, "org").await?;
        assert!(find_live_subscription(&db, "org").await?.is_none());

        let renewed =
            create_subscription(&db, "org", plan.id, BillingCycle::Monthly, date(2024, 3, 1))
                .await?;
        assert_eq!(renewed.current_period_start, date(2024, 3, 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_subscription_unknown_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let result =
            create_subscription(&db, "org", 404, BillingCycle::Monthly, date(2024, 1, 1)).await;
        assert!(matches!(result.unwrap_err(), Error::PlanNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_change_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let small = create_limited_plan(&db, "Small", Some(5), None).await?;
        let large = create_limited_plan(&db, "Large", Some(50), None).await?;
        create_subscription(&db, "org", small.id, BillingCycle::Monthly, date(2024, 1, 1)).await?;

        let changed = change_plan(&db, "org", large.id, BillingCycle::Yearly).await?;
        assert_eq!(changed.plan_id, large.id);
        assert_eq!(changed.billing_cycle, "yearly");
        assert_eq!(changed.current_period_end, date(2024, 2, 1));

        let missing = change_plan(&db, "nobody", large.id, BillingCycle::Monthly).await;
        assert!(matches!(
            missing.unwrap_err(),
            Error::SubscriptionNotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_period_rollover_not_due() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_limited_plan(&db, "Starter", None, None).await?;
        create_subscription(&db, "org", plan.id, BillingCycle::Monthly, date(2024, 1, 1)).await?;

        assert!(
            process_period_rollover(&db, "org", date(2024, 1, 31))
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_period_rollover_keeps_month_end_anchor() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_limited_plan(&db, "Starter", None, None).await?;
        let subscription =
            create_subscription(&db, "org", plan.id, BillingCycle::Monthly, date(2024, 1, 31))
                .await?;
        assert_eq!(subscription.billing_anchor, date(2024, 1, 31));
        assert_eq!(subscription.current_period_end, date(2024, 2, 29));

        let february = process_period_rollover(&db, "org", date(2024, 2, 29))
            .await?
            .unwrap();
        assert_eq!(february.period_start, date(2024, 2, 29));
        assert_eq!(february.period_end, date(2024, 3, 31));

        let march = process_period_rollover(&db, "org", date(2024, 3, 31))
            .await?
            .unwrap();
        assert_eq!(march.period_start, date(2024, 3, 31));
        assert_eq!(march.period_end, date(2024, 4, 30));

        // Skipping several periods at once lands on the same boundaries
        let skipped = process_period_rollover(&db, "org", date(2024, 7, 1))
            .await?
            .unwrap();
        assert_eq!(skipped.period_start, date(2024, 6, 30));
        assert_eq!(skipped.period_end, date(2024, 7, 31));
        assert_eq!(skipped.periods_advanced, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_period_rollover_resets_flow_usage() -> Result<()> {
        let db = setup_test_db().await?;
        let plan = create_limited_plan(&db, "Starter", None, None).await?;
        create_subscription(&db, "org", plan.id, BillingCycle::Monthly, date(2024, 1, 1)).await?;
        track_usage(&db, "org", Metric::Transactions, 12).await?;
        track_usage(&db, "org", Metric::Rooms, 3).await?;

        let rollover = process_period_rollover(&db, "org", date(2024, 3, 15))
            .await?
            .unwrap();
        assert_eq!(rollover.previous_start, date(2024, 1, 1));
        assert_eq!(rollover.period_start, date(2024, 3, 1));
        assert_eq!(rollover.period_end, date(2024, 4, 1));
        assert_eq!(rollover.periods_advanced, 2);
        assert!(format_rollover_summary(&rollover).contains("(2 periods)"));

        assert_eq!(get_metric_value(&db, "org", Metric::Transactions).await?, 0);
        assert_eq!(get_metric_value(&db, "org", Metric::Rooms).await?, 3);

        let subscription = get_active_subscription(&db, "org").await?;
        assert_eq!(subscription.current_period_start, date(2024, 3, 1));
        Ok(())
    }
}
