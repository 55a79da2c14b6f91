use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::ConfigError;

/// Parse a timezone string
pub fn parse_timezone(tz_str: &str) -> Result<Tz, ConfigError> {
    tz_str
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidTimezone(tz_str.to_string()))
}

/// Hour of day (0-23) of a UTC instant as seen in the given timezone
pub fn local_hour(now: DateTime<Utc>, timezone: &Tz) -> u32 {
    now.with_timezone(timezone).hour()
}
