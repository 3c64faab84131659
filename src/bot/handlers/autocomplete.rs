//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggests plan names and booking sources as the user types.

use crate::{bot::BotData, core::plan, errors::Error};

/// Discord caps autocomplete lists at 25 entries
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for active plan names.
///
/// # Arguments
/// * `ctx` - The poise context containing the database connection
/// * `partial` - The partial string the user has typed so far
pub async fn autocomplete_plan_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(plans) = plan::get_all_active_plans(db).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();

    // Keep price order so cheaper plans come first
    plans
        .into_iter()
        .filter(|plan| plan.name.to_lowercase().contains(&partial_lower))
        .map(|plan| plan.name)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Provides autocomplete suggestions for common booking sources.
pub async fn autocomplete_source(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let sources = ["direct", "phone", "walk-in", "booking.com", "expedia", "airbnb", "agency"];

    let partial_lower = partial.to_lowercase();

    sources
        .iter()
        .filter(|source| source.contains(&partial_lower))
        .map(|&source| source.to_string())
        .collect()
}
