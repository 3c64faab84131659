//! Loyalty Discord commands - the `points` command group.
//!
//! Customers are addressed by their numeric id, shown by `/points enroll`
//! and `/points balance`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{loyalty, report},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Parent command for the loyalty points ledger.
    #[poise::command(
        slash_command,
        subcommands(
            "points_enroll",
            "points_balance",
            "points_award",
            "points_redeem",
            "points_history"
        )
    )]
    pub async fn points(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Loyalty points command. Available subcommands:\n\
            `/points enroll` - Enroll a new customer\n\
            `/points balance` - Show balances (one customer or everyone)\n\
            `/points award` - Award points\n\
            `/points redeem` - Redeem points\n\
            `/points history` - Show a customer's ledger";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Enrolls a customer in the loyalty program.
    #[poise::command(slash_command, rename = "enroll")]
    pub async fn points_enroll(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer name"] name: String,
        #[description = "Optional email"] email: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let customer =
            loyalty::create_customer(&data.database, &data.organization_id, &name, email).await?;

        ctx.say(format!(
            "✅ Enrolled **{}** as customer #{}.",
            customer.name, customer.id
        ))
        .await?;
        Ok(())
    }

    /// Shows one customer's balance, or every customer's when no id is given.
    #[poise::command(slash_command, rename = "balance")]
    pub async fn points_balance(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer id"] customer_id: Option<i64>,
    ) -> Result<()> {
        let data = ctx.data();

        if let Some(customer_id) = customer_id {
            let customer =
                loyalty::get_customer(&data.database, &data.organization_id, customer_id).await?;
            ctx.say(format!(
                "⭐ **{}**: {} pts ({} tier, {} lifetime)",
                customer.name,
                customer.points_balance,
                loyalty::loyalty_tier(customer.lifetime_points).as_str(),
                customer.lifetime_points
            ))
            .await?;
            return Ok(());
        }

        let customers = loyalty::list_customers(&data.database, &data.organization_id).await?;
        if customers.is_empty() {
            ctx.say("⭐ No loyalty customers yet. Use `/points enroll` to add one.")
                .await?;
            return Ok(());
        }

        let mut response = String::from("⭐ **Loyalty balances**\n\n");
        for customer in &customers {
            writeln!(
                &mut response,
                "#{} {}: {} pts ({})",
                customer.id,
                customer.name,
                customer.points_balance,
                loyalty::loyalty_tier(customer.lifetime_points).as_str()
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Awards points to a customer.
    #[poise::command(slash_command, rename = "award")]
    pub async fn points_award(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer id"] customer_id: i64,
        #[description = "Points to add"] points: i64,
        #[description = "Reason (e.g., 'Stay #1042')"] reason: Option<String>,
    ) -> Result<()> {
        let reason = reason.unwrap_or_else(|| "Points awarded".to_string());
        let data = ctx.data();
        let entry = loyalty::award_points(
            &data.database,
            &data.organization_id,
            customer_id,
            points,
            reason,
        )
        .await?;

        ctx.say(format!(
            "✅ {} for customer #{customer_id}. New balance: {} pts.",
            report::format_points_delta(entry.points),
            entry.balance_after
        ))
        .await?;
        Ok(())
    }

    /// Redeems points from a customer's balance.
    #[poise::command(slash_command, rename = "redeem")]
    pub async fn points_redeem(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer id"] customer_id: i64,
        #[description = "Points to spend"] points: i64,
        #[description = "Reason (e.g., 'Free breakfast')"] reason: Option<String>,
    ) -> Result<()> {
        let reason = reason.unwrap_or_else(|| "Points redeemed".to_string());
        let data = ctx.data();
        let entry = loyalty::redeem_points(
            &data.database,
            &data.organization_id,
            customer_id,
            points,
            reason,
        )
        .await?;

        ctx.say(format!(
            "✅ {} for customer #{customer_id}. New balance: {} pts.",
            report::format_points_delta(entry.points),
            entry.balance_after
        ))
        .await?;
        Ok(())
    }

    /// Shows a customer's statement and most recent ledger entries.
    #[poise::command(slash_command, rename = "history")]
    pub async fn points_history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer id"] customer_id: i64,
        #[description = "Entries to show (default 10)"] limit: Option<u64>,
    ) -> Result<()> {
        let data = ctx.data();
        let statement = report::generate_customer_statement(
            &data.database,
            &data.organization_id,
            customer_id,
            limit,
        )
        .await?;

        ctx.say(report::format_customer_statement(&statement))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
