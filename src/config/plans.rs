//! Plan catalog loading from config.toml
//!
//! The plans defined in config.toml seed the `subscription_plans` table on
//! start-up. Plans already present (matched by name) are left alone.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Subscription plans to seed
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
}

/// Configuration for a single subscription plan
#[derive(Debug, Deserialize, Clone)]
pub struct PlanConfig {
    /// Unique plan name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Monthly price
    pub price_monthly: f64,
    /// Yearly price; omitted means 12 × monthly
    #[serde(default)]
    pub price_yearly: Option<f64>,
    /// Room quota; omitted means unlimited
    #[serde(default)]
    pub max_rooms: Option<i64>,
    /// Staff user quota; omitted means unlimited
    #[serde(default)]
    pub max_users: Option<i64>,
    /// Feature flags enabled by the plan
    #[serde(default)]
    pub features: Vec<String>,
}

/// Loads the plan catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses the plan catalog from TOML text
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the plan catalog from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}
