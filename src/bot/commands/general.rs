//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**StayLedger Help**\n\
        Here is a summary of all available commands.\n\n\
        **Billing**\n\
        • `/plans` - Lists subscription plans with monthly and yearly prices.\n\
        • `/price <plan> <cycle>` - Shows the price of a plan for a billing cycle.\n\
        • `/subscribe <plan> <cycle>` - Subscribes this organization to a plan.\n\
        • `/change_plan <plan> <cycle>` - Moves the subscription to another plan.\n\
        • `/cancel_subscription` - Cancels the subscription.\n\
        • `/usage` - Shows usage against the plan limits.\n\n\
        **Analytics**\n\
        • `/kpis <start> <end>` - Occupancy, ADR, RevPAR and average stay.\n\
        • `/dashboard <start> <end>` - KPIs plus daily occupancy, revenue by source and stay lengths.\n\n\
        **Loyalty**\n\
        • `/points enroll|balance|award|redeem|history` - Manage loyalty points.\n\n\
        **Front desk**\n\
        • `/add_room <number> <type>` - Adds a room.\n\
        • `/book <guest> <arrival> <departure> <rate> [source]` - Records a reservation.\n\
        • `/assign_room <reservation> <room>` - Assigns a room.\n\
        • `/checkin <reservation>` / `/checkout <reservation>` - Moves a guest in or out.\n\
        • `/notifications [mark_read]` - Shows recent reservation and payment changes.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        Dates use the `YYYY-MM-DD` format.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
