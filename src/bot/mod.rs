//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `StayLedger`, including all
//! slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (billing, analytics, loyalty, reservation, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    errors::{Error, Result},
    notifications::{NotificationHub, NotificationState, RowChange},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the organization this bot
/// instance serves, and the notification channel state.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Tenant every command operates on
    pub organization_id: String,
    /// Channel row changes are published to
    pub notifications: NotificationHub,
    /// Counters fed by the organization's notification listener
    pub notification_state: Arc<RwLock<NotificationState>>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        organization_id: String,
        notifications: NotificationHub,
        notification_state: Arc<RwLock<NotificationState>>,
    ) -> Self {
        Self {
            database,
            organization_id,
            notifications,
            notification_state,
        }
    }

    /// Publishes a row change, ignoring whether anyone is listening.
    pub fn publish(&self, change: RowChange) {
        let listeners = self.notifications.publish(change);
        tracing::debug!("Row change delivered to {listeners} listener(s)");
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("❌ {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Registers every command and runs the Discord client until it stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::plans(),
                commands::price(),
                commands::subscribe(),
                commands::change_plan(),
                commands::cancel_subscription(),
                commands::usage(),
                commands::kpis(),
                commands::dashboard(),
                commands::points(),
                commands::add_room(),
                commands::book(),
                commands::assign_room(),
                commands::checkin(),
                commands::checkout(),
                commands::notifications(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
