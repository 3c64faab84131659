use dotenvy::dotenv;
use stayledger::{
    bot::{self, BotData},
    config,
    core::plan,
    errors::{Error, Result},
    notifications::{self, NotificationHub, NotificationState},
};
use std::{env, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Database and schema
    let database = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&database)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the plan catalog; a missing config.toml only skips seeding
    match config::plans::load_default_config() {
        Ok(catalog) => {
            let seeded = plan::seed_plans(&database, &catalog.plans).await?;
            info!("Seeded {} new plan(s) from config.toml", seeded);
        }
        Err(e) => warn!("Skipping plan seeding: {}", e),
    }

    // 5. Notification channel for this organization
    let organization_id = config::organization::get_organization_id();
    let hub = NotificationHub::new(config::organization::get_notification_capacity());
    let state = Arc::new(RwLock::new(NotificationState::default()));
    let listener =
        notifications::spawn_listener(&hub, organization_id.clone(), Arc::clone(&state));
    info!("Serving organization '{}'", organization_id);

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(database, organization_id, hub, state);
    let result = bot::run_bot(token, data).await;

    listener.abort();
    result
}
