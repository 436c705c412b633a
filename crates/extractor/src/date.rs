//! Date resolution
//!
//! Explicit dates in the message body win, then the receipt timestamp, then
//! processing time. Two-digit years land in [2000, 2099]; a date more than
//! one day in the future is treated as a parse artifact and snapped to now.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[-/](\d{1,2})[-/](\d{2,4})\b").unwrap());

static MONTH_NAME_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})[-\s]?(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*[-\s]?(\d{2,4})\b")
        .unwrap()
});

/// Explicit date in the text, if any. No future clamping here.
pub fn parse_explicit(text: &str) -> Option<NaiveDate> {
    for captures in NUMERIC_DATE.captures_iter(text) {
        let day = captures.get(1)?.as_str().parse().ok()?;
        let month = captures.get(2)?.as_str().parse().ok()?;
        let year = captures.get(3)?.as_str().parse().ok()?;
        if let Some(date) = build(day, month, year) {
            return Some(date);
        }
    }
    for captures in MONTH_NAME_DATE.captures_iter(text) {
        let day = captures.get(1)?.as_str().parse().ok()?;
        let month = month_number(captures.get(2)?.as_str())?;
        let year = captures.get(3)?.as_str().parse().ok()?;
        if let Some(date) = build(day, month, year) {
            return Some(date);
        }
    }
    None
}

/// Transaction timestamp for a message: explicit date in the text, else the
/// receipt time, else `now`.
pub fn resolve(text: &str, received_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(date) = parse_explicit(text) {
        if let Some(timestamp) = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()) {
            if timestamp > now + Duration::days(1) {
                return now;
            }
            return timestamp;
        }
    }
    received_at.unwrap_or(now)
}

fn build(day: u32, month: u32, year: i32) -> Option<NaiveDate> {
    let year = if year < 100 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn numeric_and_month_name_formats() {
        assert_eq!(parse_explicit("debited on 12-08-25 via UPI"), Some(ymd(2025, 8, 12)));
        assert_eq!(parse_explicit("debited on 12/08/2025"), Some(ymd(2025, 8, 12)));
        assert_eq!(parse_explicit("spent on 12-Aug-25 at AMAZON"), Some(ymd(2025, 8, 12)));
        assert_eq!(parse_explicit("spent on 15 August 2025"), Some(ymd(2025, 8, 15)));
        assert_eq!(parse_explicit("no date in this message"), None);
    }

    #[test]
    fn two_digit_years_land_in_this_century() {
        assert_eq!(parse_explicit("on 01-01-99"), Some(ymd(2099, 1, 1)));
        assert_eq!(parse_explicit("on 01-01-30"), Some(ymd(2030, 1, 1)));
    }

    #[test]
    fn invalid_calendar_dates_are_skipped() {
        assert_eq!(parse_explicit("txn 99-99-99 confirmed"), None);
        assert_eq!(parse_explicit("on 31-02-25"), None);
    }

    #[test]
    fn far_future_dates_snap_to_now() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        // Year "30" reads as 2030, which is in the future, so it snaps.
        assert_eq!(resolve("debited on 01-01-30", None, now), now);
        assert_eq!(resolve("debited on 26-08-26", None, now), now);
    }

    #[test]
    fn near_future_within_a_day_is_kept() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let resolved = resolve("scheduled debit on 24-08-26", None, now);
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 8, 24, 0, 0, 0).unwrap());
    }

    #[test]
    fn fallback_chain_receipt_then_now() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let received = Utc.with_ymd_and_hms(2026, 8, 20, 9, 30, 0).unwrap();
        assert_eq!(resolve("no date here", Some(received), now), received);
        assert_eq!(resolve("no date here", None, now), now);
    }
}
