/// Database configuration and connection management
pub mod database;

/// Organization and runtime settings from environment variables
pub mod organization;

/// Subscription plan catalog loading from config.toml
pub mod plans;
