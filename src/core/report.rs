//! Report generation - Plain-text views over KPIs, plans, usage and loyalty.
//!
//! All functions are framework-agnostic and return structured data or strings
//! that the bot layer posts as-is.

use crate::{
    core::{
        analytics::{DailyOccupancy, Dashboard, KpiData},
        billing::PlanPricing,
        loyalty::{self, LoyaltyTier},
        usage::UsageStatus,
    },
    entities::{loyalty_customer, loyalty_transaction, subscription_plan},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Longest message Discord accepts, in characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Occupancy rows shown before days are grouped into spans
const MAX_OCCUPANCY_ROWS: usize = 14;

/// Booking channels listed individually on the dashboard
const MAX_SOURCE_ROWS: usize = 8;

/// A customer's balance with their most recent ledger entries.
#[derive(Debug, Clone)]
pub struct CustomerStatement {
    /// The customer being reported on
    pub customer: loyalty_customer::Model,
    /// Tier earned by lifetime points
    pub tier: LoyaltyTier,
    /// Most recent ledger entries, newest first
    pub recent_entries: Vec<loyalty_transaction::Model>,
}

/// Builds a statement for `customer_id` with up to `entry_limit` entries (default 10).
pub async fn generate_customer_statement(
    db: &DatabaseConnection,
    organization_id: &str,
    customer_id: i64,
    entry_limit: Option<u64>,
) -> Result<CustomerStatement> {
    let customer = loyalty::get_customer(db, organization_id, customer_id).await?;

    let limit = entry_limit.unwrap_or(10);
    let recent_entries: Vec<loyalty_transaction::Model> = loyalty::get_ledger(db, customer_id)
        .await?
        .into_iter()
        .take(limit.try_into()?)
        .collect();

    Ok(CustomerStatement {
        tier: loyalty::loyalty_tier(customer.lifetime_points),
        customer,
        recent_entries,
    })
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // Cast safety: clamped_progress ∈ [0, 100], length is small (10-20).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// Formats a points delta with its sign, e.g. `+120 pts` or `-70 pts`.
#[must_use]
pub fn format_points_delta(points: i64) -> String {
    if points >= 0 {
        format!("+{points} pts")
    } else {
        format!("-{} pts", points.unsigned_abs())
    }
}

/// Summary line for a ledger entry.
#[must_use]
pub fn format_ledger_entry(entry: &loyalty_transaction::Model) -> String {
    format!(
        "{} | {} | {} | balance {}",
        format_points_delta(entry.points),
        entry.transaction_type,
        entry.reason,
        entry.balance_after
    )
}

/// Renders a customer statement.
#[must_use]
pub fn format_customer_statement(statement: &CustomerStatement) -> String {
    let customer = &statement.customer;
    let mut text = format!(
        "**{}** ({} tier)\nBalance: {} pts | Lifetime: {} pts\n",
        customer.name,
        statement.tier.as_str(),
        customer.points_balance,
        customer.lifetime_points
    );

    if statement.recent_entries.is_empty() {
        text.push_str("No ledger entries yet.");
    }
    for entry in &statement.recent_entries {
        text.push_str(&format!("• {}\n", format_ledger_entry(entry)));
    }
    text
}

/// Renders the headline KPIs.
#[must_use]
pub fn format_kpi_report(kpis: &KpiData) -> String {
    format!(
        "Occupancy: {}\n\
         ADR: ${:.2} | RevPAR: ${:.2}\n\
         Revenue: ${:.2} from {} reservations\n\
         Average stay: {:.1} nights ({} of {} room-nights sold)",
        format_progress_bar(kpis.occupancy_rate, None),
        kpis.adr,
        kpis.revpar,
        kpis.total_revenue,
        kpis.total_reservations,
        kpis.average_stay_length,
        kpis.total_room_nights,
        kpis.available_room_nights
    )
}

/// Renders the full dashboard.
///
/// Long ranges show occupancy per span of days rather than per day, and only
/// the top booking channels are listed, so the text fits one chat message.
#[must_use]
pub fn format_dashboard(dashboard: &Dashboard) -> String {
    let mut text = format_kpi_report(&dashboard.kpis);

    text.push_str("\n\n**Daily occupancy**\n");
    let span = dashboard
        .daily_occupancy
        .len()
        .div_ceil(MAX_OCCUPANCY_ROWS)
        .max(1);
    for days in dashboard.daily_occupancy.chunks(span) {
        text.push_str(&format_occupancy_row(days));
        text.push('\n');
    }

    text.push_str("\n**Revenue by source**\n");
    for source in dashboard.revenue_by_source.iter().take(MAX_SOURCE_ROWS) {
        text.push_str(&format!(
            "{}: ${:.2} ({} reservations)\n",
            source.source, source.revenue, source.reservations
        ));
    }
    let hidden = dashboard
        .revenue_by_source
        .len()
        .saturating_sub(MAX_SOURCE_ROWS);
    if hidden > 0 {
        text.push_str(&format!("...and {hidden} more sources\n"));
    }

    text.push_str("\n**Stay length**\n");
    let buckets: Vec<String> = dashboard
        .stay_lengths
        .iter()
        .map(|bucket| format!("{}n: {}", bucket.label, bucket.count))
        .collect();
    text.push_str(&buckets.join(" | "));
    text
}

/// One occupancy row: a single day, or the average over a span of days.
#[allow(clippy::cast_precision_loss)]
fn format_occupancy_row(days: &[DailyOccupancy]) -> String {
    match days {
        [] => String::new(),
        [day] => format!(
            "{} {}",
            day.date.format("%a %d %b"),
            format_progress_bar(day.occupancy_rate, Some(8))
        ),
        [first, .., last] => {
            let average =
                days.iter().map(|day| day.occupancy_rate).sum::<f64>() / days.len() as f64;
            format!(
                "{} - {} {}",
                first.date.format("%d %b"),
                last.date.format("%d %b"),
                format_progress_bar(average, Some(8))
            )
        }
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut with `…`.
#[must_use]
pub fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// One line per plan: name, prices and yearly discount.
#[must_use]
pub fn format_plan_line(plan: &subscription_plan::Model, pricing: &PlanPricing) -> String {
    let mut line = format!(
        "**{}**: ${:.2}/month or ${:.2}/year",
        plan.name, pricing.monthly_price, pricing.yearly_price
    );
    if pricing.discount_percent > 0 {
        line.push_str(&format!(
            " (save ${:.2}, {}% off)",
            pricing.yearly_savings, pricing.discount_percent
        ));
    }
    line
}

/// One line per metric: value against limit.
#[must_use]
pub fn format_usage_status(status: &UsageStatus) -> String {
    let marker = if status.limit_reached { "⚠️" } else { "✅" };
    match status.limit {
        Some(limit) => format!(
            "{marker} {}: {} / {limit}",
            status.metric.as_str(),
            status.current
        ),
        None => format!(
            "{marker} {}: {} (unlimited)",
            status.metric.as_str(),
            status.current
        ),
    }
}
