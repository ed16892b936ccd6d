//! Time helpers — business timezone conversion
//!
//! All wall-clock decisions (the cleanup trigger, the start-of-day cutoff)
//! happen in the configured business timezone; timestamps themselves stay
//! in UTC.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Start of the given calendar date (00:00:00) in the business timezone
///
/// DST gap fallback: if local midnight does not exist, the later of the two
/// candidate instants is used; if neither resolves, the naive time is read
/// as UTC.
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Parse a timezone name, falling back to UTC
pub fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or_else(|_| {
        tracing::warn!("unknown timezone '{}', falling back to UTC", name);
        chrono_tz::UTC
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_start_in_tz() {
        let tz = chrono_tz::Europe::London;
        // August: BST, UTC+1
        let date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        let start = day_start(date, tz);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 4, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_timezone_fallback() {
        assert_eq!(parse_timezone("Europe/Madrid"), chrono_tz::Europe::Madrid);
        assert_eq!(parse_timezone("Not/AZone"), chrono_tz::UTC);
    }
}
