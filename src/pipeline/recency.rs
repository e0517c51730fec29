// src/pipeline/recency.rs

//! Posted-date resolution and recency filtering.
//!
//! Scrapers report posted dates in wildly inconsistent formats
//! ("2 days ago", "1d", "Aug 24", "just posted"). Resolution is a
//! cascade of format handlers tried in a fixed order; the first match
//! wins. When nothing matches, the date resolves to the `Recent`
//! sentinel and the posting is included: an unparseable date must
//! never cause exclusion.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;

use crate::models::{Period, ResolvedDate};

/// Unbounded "N+ days ago" stale markers are capped at this many days.
const STALE_MARKER_CAP_DAYS: i64 = 90;

/// Absolute cutoff for a period, relative to `now`.
///
/// `Day` is the start of *yesterday*, not "now minus 24h": a run at
/// 09:00 should still pick up everything posted the previous day.
pub fn cutoff(period: Period, now: DateTime<Utc>) -> DateTime<Utc> {
    match period {
        Period::Day => (now - Duration::days(1))
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc(),
        Period::ThreeDays => now - Duration::days(3),
        Period::Week => now - Duration::days(7),
        Period::Month => now - Duration::days(30),
        Period::ThreeMonths => now - Duration::days(90),
    }
}

/// Resolve a free-form posted-date string against `now`.
pub fn resolve_posted_date(raw: &str, now: DateTime<Utc>) -> ResolvedDate {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return ResolvedDate::Recent;
    }

    let handlers: &[fn(&str, DateTime<Utc>) -> Option<DateTime<Utc>>] = &[
        parse_special_token,
        parse_stale_marker,
        parse_shorthand_age,
        parse_relative_age,
        parse_month_day,
        parse_generic,
    ];

    for handler in handlers {
        if let Some(date) = handler(&text, now) {
            return ResolvedDate::Date(date);
        }
    }

    log::debug!("Unrecognized posted date '{}', treating as recent", raw);
    ResolvedDate::Recent
}

/// Whether a resolved date falls within the period's cutoff.
pub fn is_recent(resolved: ResolvedDate, period: Period, now: DateTime<Utc>) -> bool {
    match resolved {
        ResolvedDate::Recent => true,
        ResolvedDate::Date(date) => date >= cutoff(period, now),
    }
}

/// `today`, `just posted`, `ongoing` -> now; `yesterday` -> previous noon.
fn parse_special_token(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match text {
        "today" | "just posted" | "ongoing" | "hiring ongoing" => Some(now),
        "yesterday" => (now - Duration::days(1))
            .date_naive()
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc()),
        _ => None,
    }
}

/// Compile a hardcoded pattern once.
fn cached_regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hardcoded date pattern is valid"))
}

/// `"N+ days ago"` -> now - min(N, 90) days.
fn parse_stale_marker(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached_regex(&RE, r"^(\d+)\+\s*days?\s*ago$");
    let caps = re.captures(text)?;
    let days: i64 = caps.get(1)?.as_str().parse().ok()?;
    now.checked_sub_signed(Duration::try_days(days.min(STALE_MARKER_CAP_DAYS))?)
}

/// Shorthand age tokens: `"Nd"` -> N days, `"Nmo"` / `"Nm"` -> N months.
///
/// An age too large for date arithmetic is no match; the cascade then
/// falls through to the inclusive `Recent` fallback.
fn parse_shorthand_age(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached_regex(&RE, r"^(\d+)\s*(mo|m|d)$");
    let caps = re.captures(text)?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    let days = match caps.get(2)?.as_str() {
        "d" => n,
        // "m" is ambiguous (minutes vs months); scrapers use it for months
        "mo" | "m" => n.checked_mul(30)?,
        _ => return None,
    };
    now.checked_sub_signed(Duration::try_days(days)?)
}

/// Relative age: `"N {hour|day|week|month}(s) ago"`.
fn parse_relative_age(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached_regex(&RE, r"^(\d+)\s*(hour|day|week|month)s?\s*ago$");
    let caps = re.captures(text)?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    let offset = match caps.get(2)?.as_str() {
        "hour" => Duration::try_hours(n)?,
        "day" => Duration::try_days(n)?,
        "week" => Duration::try_days(n.checked_mul(7)?)?,
        "month" => Duration::try_days(n.checked_mul(30)?)?,
        _ => return None,
    };
    now.checked_sub_signed(offset)
}

/// Abbreviated absolute date: `"Aug 24"` -> current year, midnight.
fn parse_month_day(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let candidate = format!("{} {}", text, now.date_naive().format("%Y"));
    let date = NaiveDate::parse_from_str(&candidate, "%b %d %Y").ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

/// Generic fallback: RFC 3339 and a few common absolute formats.
fn parse_generic(text: &str, _now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%B %d, %Y", "%b %d, %Y"];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_time(NaiveTime::MIN).and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 25, 15, 0, 0).unwrap()
    }

    fn resolved_date(raw: &str) -> DateTime<Utc> {
        match resolve_posted_date(raw, fixed_now()) {
            ResolvedDate::Date(d) => d,
            ResolvedDate::Recent => panic!("expected concrete date for '{}'", raw),
        }
    }

    #[test]
    fn test_special_tokens() {
        let now = fixed_now();
        assert_eq!(resolved_date("Today"), now);
        assert_eq!(resolved_date("just posted"), now);
        assert_eq!(resolved_date("Hiring ongoing"), now);
        assert_eq!(
            resolved_date("yesterday"),
            Utc.with_ymd_and_hms(2025, 8, 24, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_stale_marker_is_capped() {
        let now = fixed_now();
        assert_eq!(resolved_date("30+ days ago"), now - Duration::days(30));
        assert_eq!(resolved_date("365+ days ago"), now - Duration::days(90));
    }

    #[test]
    fn test_shorthand_ages() {
        let now = fixed_now();
        assert_eq!(resolved_date("1d"), now - Duration::days(1));
        assert_eq!(resolved_date("3 d"), now - Duration::days(3));
        assert_eq!(resolved_date("2mo"), now - Duration::days(60));
        assert_eq!(resolved_date("1m"), now - Duration::days(30));
    }

    #[test]
    fn test_relative_ages() {
        let now = fixed_now();
        assert_eq!(resolved_date("5 hours ago"), now - Duration::hours(5));
        assert_eq!(resolved_date("2 days ago"), now - Duration::days(2));
        assert_eq!(resolved_date("1 week ago"), now - Duration::days(7));
        assert_eq!(resolved_date("3 months ago"), now - Duration::days(90));
    }

    #[test]
    fn test_month_day_assumes_current_year() {
        assert_eq!(
            resolved_date("Aug 24"),
            Utc.with_ymd_and_hms(2025, 8, 24, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_generic_formats() {
        assert_eq!(
            resolved_date("2025-08-20"),
            Utc.with_ymd_and_hms(2025, 8, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(
            resolved_date("08/20/2025"),
            Utc.with_ymd_and_hms(2025, 8, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(
            resolved_date("August 20, 2025"),
            Utc.with_ymd_and_hms(2025, 8, 20, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_resolves_recent() {
        assert_eq!(
            resolve_posted_date("who knows", fixed_now()),
            ResolvedDate::Recent
        );
        assert_eq!(resolve_posted_date("", fixed_now()), ResolvedDate::Recent);
        assert_eq!(
            resolve_posted_date("   ", fixed_now()),
            ResolvedDate::Recent
        );
    }

    #[test]
    fn test_absurd_ages_resolve_recent() {
        // Counts beyond what date arithmetic can represent must not
        // abort resolution; such postings are treated as recent.
        for raw in [
            "999999999999 days ago",
            "999999999999 hours ago",
            "999999999999d",
            "999999999999mo",
            "9223372036854775807 weeks ago",
            "99999999999999999999 days ago",
        ] {
            assert_eq!(
                resolve_posted_date(raw, fixed_now()),
                ResolvedDate::Recent,
                "'{}' should fall through to the recent sentinel",
                raw
            );
        }
    }

    #[test]
    fn test_day_cutoff_is_start_of_yesterday() {
        let now = fixed_now();
        assert_eq!(
            cutoff(Period::Day, now),
            Utc.with_ymd_and_hms(2025, 8, 24, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_recent_sentinel_always_recent() {
        let now = fixed_now();
        for period in [
            Period::Day,
            Period::ThreeDays,
            Period::Week,
            Period::Month,
            Period::ThreeMonths,
        ] {
            assert!(is_recent(ResolvedDate::Recent, period, now));
        }
    }

    #[test]
    fn test_recency_boundaries() {
        let now = fixed_now();

        // "1d" resolves to the same clock time yesterday, which is
        // after the start-of-yesterday cutoff.
        let one_day = resolve_posted_date("1d", now);
        assert!(is_recent(one_day, Period::Day, now));

        // 45 days ago is outside the 30-day month window.
        let stale = resolve_posted_date("45 days ago", now);
        assert!(!is_recent(stale, Period::Month, now));
        assert!(is_recent(stale, Period::ThreeMonths, now));
    }

    #[test]
    fn test_yesterday_noon_within_day_period() {
        let now = fixed_now();
        let yesterday = resolve_posted_date("yesterday", now);
        assert!(is_recent(yesterday, Period::Day, now));
    }
}
