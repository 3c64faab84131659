//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Reservation analytics commands
pub mod analytics;

/// Plan, pricing, subscription and usage commands
pub mod billing;

/// General utility commands
pub mod general;

/// Loyalty points commands
pub mod loyalty;

/// Room and reservation front-desk commands
pub mod reservation;

// Export commands
pub use analytics::*;
pub use billing::*;
pub use general::*;
pub use loyalty::*;
pub use reservation::*;

use crate::errors::{Error, Result};
use chrono::NaiveDate;

/// Parses a `YYYY-MM-DD` command argument.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidValue {
        field: "date (expected YYYY-MM-DD)",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2024-02-29 ").ok(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(matches!(
            parse_date("29/02/2024"),
            Err(Error::InvalidValue { .. })
        ));
        assert!(parse_date("2023-02-29").is_err());
    }
}
