//! Analytics Discord commands - `kpis` and `dashboard`.
//!
//! Both take an inclusive `YYYY-MM-DD` date range.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::parse_date},
        core::{analytics, report},
        errors::{Error, Result},
    };

    /// Shows occupancy, ADR, `RevPAR` and average stay length for a date range.
    #[poise::command(slash_command, prefix_command)]
    pub async fn kpis(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "First day (YYYY-MM-DD)"] start: String,
        #[description = "Last day, inclusive (YYYY-MM-DD)"] end: String,
    ) -> Result<()> {
        let data = ctx.data();
        let (start, end) = (parse_date(&start)?, parse_date(&end)?);

        let kpis = analytics::fetch_kpis(&data.database, &data.organization_id, start, end).await?;

        ctx.say(format!(
            "📊 **KPIs {start} to {end}**\n\n{}",
            report::format_kpi_report(&kpis)
        ))
        .await?;
        Ok(())
    }

    /// Shows the full reservation dashboard for a date range.
    #[poise::command(slash_command, prefix_command)]
    pub async fn dashboard(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "First day (YYYY-MM-DD)"] start: String,
        #[description = "Last day, inclusive (YYYY-MM-DD)"] end: String,
    ) -> Result<()> {
        let data = ctx.data();
        let (start, end) = (parse_date(&start)?, parse_date(&end)?);

        // Several queries; acknowledge first
        ctx.defer().await?;

        let dashboard =
            analytics::load_dashboard(&data.database, &data.organization_id, start, end).await?;

        let text = format!(
            "📊 **Dashboard {start} to {end}**\n\n{}",
            report::format_dashboard(&dashboard)
        );
        ctx.say(report::truncate_message(&text, report::DISCORD_MESSAGE_LIMIT))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
