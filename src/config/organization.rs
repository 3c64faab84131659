//! Runtime settings loaded from environment variables.
//!
//! The organization a bot instance serves is read once at start-up and passed
//! down explicitly; nothing below the bot layer reads the environment.

const DEFAULT_ORGANIZATION_ID: &str = "default";
const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Gets the organization id from `ORGANIZATION_ID`, falling back to `"default"`.
///
/// Blank values are treated as unset.
#[must_use]
pub fn get_organization_id() -> String {
    std::env::var("ORGANIZATION_ID")
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_ORGANIZATION_ID.to_string())
}

/// Gets the realtime notification buffer size from `NOTIFICATION_CAPACITY`.
///
/// Unparseable or zero values fall back to the default.
#[must_use]
pub fn get_notification_capacity() -> usize {
    parse_capacity(std::env::var("NOTIFICATION_CAPACITY").ok().as_deref())
}

fn parse_capacity(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|capacity| *capacity > 0)
        .unwrap_or(DEFAULT_NOTIFICATION_CAPACITY)
}
