//! Month handling for budgets ("YYYY-MM") built on chrono, not raw strings.

use chrono::{Datelike, NaiveDate, Utc};

const MONTH_FORMAT: &str = "%Y-%m";

/// Validate a "YYYY-MM" month string, returning it normalized.
pub fn parse_month(s: &str) -> Result<String, String> {
    let padded = format!("{}-01", s);
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .map(|d| d.format(MONTH_FORMAT).to_string())
        .map_err(|_| format!("Invalid month '{}', expected YYYY-MM", s))
}

/// Current month as "YYYY-MM" (UTC).
pub fn current_month() -> String {
    let now = Utc::now();
    format!("{:04}-{:02}", now.year(), now.month())
}
