//! Billing Discord commands - plans, pricing, subscriptions and usage.
//!
//! Pricing and quota rules live in `core::billing` and `core::usage`; these
//! commands resolve plan names and format the results.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{billing, billing::BillingCycle, plan, report, subscription, usage},
        entities::subscription_plan,
        errors::{Error, Result},
    };
    use chrono::Utc;
    use std::fmt::Write;

    /// Billing cycle picker shown in Discord
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum CycleChoice {
        #[name = "monthly"]
        Monthly,
        #[name = "yearly"]
        Yearly,
    }

    impl From<CycleChoice> for BillingCycle {
        fn from(choice: CycleChoice) -> Self {
            match choice {
                CycleChoice::Monthly => Self::Monthly,
                CycleChoice::Yearly => Self::Yearly,
            }
        }
    }

    async fn find_plan(
        ctx: poise::Context<'_, BotData, Error>,
        plan_name: &str,
    ) -> Result<subscription_plan::Model> {
        plan::get_plan_by_name(&ctx.data().database, plan_name)
            .await?
            .filter(|plan| plan.is_active)
            .ok_or_else(|| Error::PlanNotFound {
                name: plan_name.to_string(),
            })
    }

    /// Lists every active plan with its monthly and yearly price.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plans(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let plans = plan::get_all_active_plans(&ctx.data().database).await?;

        if plans.is_empty() {
            ctx.say("📋 No plans configured. Add `[[plans]]` entries to config.toml.")
                .await?;
            return Ok(());
        }

        let mut response = String::from("📋 **Subscription Plans**\n\n");
        for plan in &plans {
            let pricing = billing::plan_pricing(plan);
            writeln!(&mut response, "{}", report::format_plan_line(plan, &pricing))?;
            if let Some(description) = &plan.description {
                writeln!(&mut response, "  {description}")?;
            }
            let features = plan.feature_list();
            if !features.is_empty() {
                writeln!(&mut response, "  Features: {}", features.join(", "))?;
            }
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Shows what a plan costs for a billing cycle.
    #[poise::command(slash_command, prefix_command)]
    pub async fn price(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Plan name"]
        #[autocomplete = "autocomplete::autocomplete_plan_name"]
        plan_name: String,
        #[description = "Billing cycle"] cycle: CycleChoice,
    ) -> Result<()> {
        let plan = find_plan(ctx, &plan_name).await?;
        let cycle = BillingCycle::from(cycle);
        let amount = billing::calculate_subscription_price(&plan, cycle);

        let mut response = format!(
            "💳 **{}** ({}): ${amount:.2}",
            plan.name,
            cycle.as_str()
        );
        if cycle == BillingCycle::Yearly {
            let discount = billing::discount_percentage(&plan);
            if discount > 0 {
                write!(
                    &mut response,
                    " - saves ${:.2} ({discount}% off monthly billing)",
                    billing::yearly_savings(&plan)
                )?;
            }
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Subscribes this organization to a plan, starting today.
    #[poise::command(slash_command, prefix_command)]
    pub async fn subscribe(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Plan name"]
        #[autocomplete = "autocomplete::autocomplete_plan_name"]
        plan_name: String,
        #[description = "Billing cycle"] cycle: CycleChoice,
    ) -> Result<()> {
        let data = ctx.data();
        let plan = find_plan(ctx, &plan_name).await?;
        let cycle = BillingCycle::from(cycle);
        let today = Utc::now().date_naive();

        let created = subscription::create_subscription(
            &data.database,
            &data.organization_id,
            plan.id,
            cycle,
            today,
        )
        .await?;

        ctx.say(format!(
            "✅ Subscribed to **{}** ({}) at ${:.2}. Current period: {} to {}.",
            plan.name,
            cycle.as_str(),
            billing::calculate_subscription_price(&plan, cycle),
            created.current_period_start,
            created.current_period_end
        ))
        .await?;
        Ok(())
    }

    /// Moves the subscription to another plan or billing cycle.
    #[poise::command(slash_command, prefix_command)]
    pub async fn change_plan(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "New plan name"]
        #[autocomplete = "autocomplete::autocomplete_plan_name"]
        plan_name: String,
        #[description = "Billing cycle"] cycle: CycleChoice,
    ) -> Result<()> {
        let data = ctx.data();
        let plan = find_plan(ctx, &plan_name).await?;
        let cycle = BillingCycle::from(cycle);

        let updated =
            subscription::change_plan(&data.database, &data.organization_id, plan.id, cycle)
                .await?;

        ctx.say(format!(
            "✅ Switched to **{}** ({}). The new cycle applies after {}.",
            plan.name,
            cycle.as_str(),
            updated.current_period_end
        ))
        .await?;
        Ok(())
    }

    /// Cancels this organization's subscription.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cancel_subscription(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        subscription::cancel_subscription(&data.database, &data.organization_id).await?;
        ctx.say("🛑 Subscription cancelled. Usage is no longer limited by a plan.")
            .await?;
        Ok(())
    }

    /// Shows usage against the plan limits, rolling the billing period over if due.
    #[poise::command(slash_command, prefix_command)]
    pub async fn usage(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let db = &data.database;
        let today = Utc::now().date_naive();

        let mut response = String::from("📈 **Usage**\n\n");

        match subscription::find_live_subscription(db, &data.organization_id).await? {
            Some(current) => {
                if let Some(rollover) =
                    subscription::process_period_rollover(db, &data.organization_id, today).await?
                {
                    writeln!(
                        &mut response,
                        "🔄 {}\n",
                        subscription::format_rollover_summary(&rollover)
                    )?;
                }
                let plan_name = plan::get_plan_by_id(db, current.plan_id)
                    .await?
                    .map_or_else(|| "unknown plan".to_string(), |plan| plan.name);
                writeln!(
                    &mut response,
                    "Plan: **{plan_name}** ({})",
                    current.billing_cycle
                )?;
            }
            None => writeln!(&mut response, "No active subscription; usage is unmetered.")?,
        }

        for status in usage::usage_summary(db, &data.organization_id).await? {
            writeln!(&mut response, "{}", report::format_usage_status(&status))?;
        }

        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
