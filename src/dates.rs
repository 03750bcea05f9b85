//! Forgiving date handling for story ages and feed timestamps.
//!
//! [`parse_human_date`] turns whatever a listing shows as a story's age into an
//! absolute UTC timestamp. It scans the text for something date-like and
//! ignores the rest, so `"posted 3 hours ago by pg"` and `"10 Jan 2024"` both
//! work. It never fails loudly: text without a recognisable date yields `None`.
//!
//! Supported shapes:
//!
//! | Shape | Example |
//! |-------|---------|
//! | RFC 3339 / RFC 2822 | `2024-01-10T12:34:56Z`, `Wed, 10 Jan 2024 12:34:56 +0000` |
//! | ISO date, optional time | `2024-01-10`, `2024-01-10 12:34`, `2024-01-10T12:34:56` |
//! | Day, month name, year | `10 Jan 2024`, `3rd March 2023` |
//! | Month name, day, year | `Jan 10, 2024` |
//! | Numeric, month first | `01/10/2024` (`25/12/2024` falls back to day first) |
//! | Relative | `3 hours ago`, `an hour ago`, `2 weeks ago` |
//! | Keywords, optional time | `now`, `today`, `yesterday 14:00`, `tomorrow 9pm` |
//!
//! Naive values are interpreted as UTC.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+|an?|one)\s+(second|sec|minute|min|hour|hr|day|week|month|year)s?\s+ago\b")
        .unwrap()
});
static KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(now|today|tonight|yesterday|tomorrow)\b").unwrap());
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*(am|pm)\b)?").unwrap());
static TIME_12H_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})\s*(am|pm)\b").unwrap());
static ISO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:[t ](\d{1,2}):(\d{2})(?::(\d{2}))?)?").unwrap()
});
static DAY_MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b",
    )
    .unwrap()
});
static MONTH_DAY_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
    )
    .unwrap()
});
static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

/// Parse free-form date text relative to the current time.
///
/// Accepts `&str` or `Option<&str>`; `None`, empty and unparseable text all
/// yield `None`.
pub fn parse_human_date<'a>(text: impl Into<Option<&'a str>>) -> Option<DateTime<Utc>> {
    parse_human_date_at(text, Utc::now())
}

/// Same as [`parse_human_date`] with an explicit reference instant for
/// relative expressions.
pub fn parse_human_date_at<'a>(
    text: impl Into<Option<&'a str>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let text = text.into()?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let lower = text.to_lowercase();
    let time = find_time(&lower);

    find_relative(&lower, now)
        .or_else(|| find_keyword(&lower, now, time))
        .or_else(|| find_iso(&lower, time))
        .or_else(|| find_calendar_date(&lower).map(|date| at_time(date, time)))
        .or_else(|| time.map(|t| at_time(now.date_naive(), Some(t))))
}

/// Format a timestamp the way RSS wants it: `Tue, 03 Jun 2003 09:39:21 GMT`.
pub fn format_rfc2822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn at_time(date: NaiveDate, time: Option<NaiveTime>) -> DateTime<Utc> {
    NaiveDateTime::new(date, time.unwrap_or(NaiveTime::MIN)).and_utc()
}

fn find_time(text: &str) -> Option<NaiveTime> {
    if let Some(caps) = TIME_RE.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        let second: u32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
        let hour = apply_meridiem(hour, caps.get(4).map(|m| m.as_str()))?;
        return NaiveTime::from_hms_opt(hour, minute, second);
    }
    let caps = TIME_12H_RE.captures(text)?;
    let hour = apply_meridiem(caps[1].parse().ok()?, Some(&caps[2]))?;
    NaiveTime::from_hms_opt(hour, 0, 0)
}

fn apply_meridiem(hour: u32, meridiem: Option<&str>) -> Option<u32> {
    match meridiem {
        None => Some(hour),
        Some(_) if hour == 0 || hour > 12 => None,
        Some("am") => Some(hour % 12),
        Some(_) => Some(hour % 12 + 12),
    }
}

fn find_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RELATIVE_RE.captures(text)?;
    let amount: u32 = match &caps[1] {
        "a" | "an" | "one" => 1,
        n => n.parse().ok()?,
    };
    let n = i64::from(amount);
    let delta = match &caps[2] {
        "second" | "sec" => TimeDelta::try_seconds(n),
        "minute" | "min" => TimeDelta::try_minutes(n),
        "hour" | "hr" => TimeDelta::try_hours(n),
        "day" => TimeDelta::try_days(n),
        "week" => TimeDelta::try_weeks(n),
        "month" => return now.checked_sub_months(Months::new(amount)),
        "year" => return now.checked_sub_months(Months::new(amount.checked_mul(12)?)),
        _ => None,
    }?;
    now.checked_sub_signed(delta)
}

fn find_keyword(
    text: &str,
    now: DateTime<Utc>,
    time: Option<NaiveTime>,
) -> Option<DateTime<Utc>> {
    let caps = KEYWORD_RE.captures(text)?;
    let today = now.date_naive();
    let date = match &caps[1] {
        "now" if time.is_none() => return Some(now),
        "yesterday" => today.pred_opt()?,
        "tomorrow" => today.succ_opt()?,
        _ => today,
    };
    Some(at_time(date, time))
}

fn find_iso(text: &str, fallback_time: Option<NaiveTime>) -> Option<DateTime<Utc>> {
    let caps = ISO_RE.captures(text)?;
    let date = ymd(&caps[1], &caps[2], &caps[3])?;
    let time = match caps.get(4) {
        Some(hour) => {
            let second = caps.get(6).map_or("0", |m| m.as_str());
            Some(NaiveTime::from_hms_opt(
                hour.as_str().parse().ok()?,
                caps[5].parse().ok()?,
                second.parse().ok()?,
            )?)
        }
        None => fallback_time,
    };
    Some(at_time(date, time))
}

fn find_calendar_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DAY_MONTH_YEAR_RE.captures(text) {
        return named_month_date(&caps, 3, 2, 1);
    }
    if let Some(caps) = MONTH_DAY_YEAR_RE.captures(text) {
        return named_month_date(&caps, 3, 1, 2);
    }
    let caps = NUMERIC_RE.captures(text)?;
    ymd(&caps[3], &caps[1], &caps[2]).or_else(|| ymd(&caps[3], &caps[2], &caps[1]))
}

fn named_month_date(caps: &Captures<'_>, year: usize, month: usize, day: usize) -> Option<NaiveDate> {
    let month = month_number(&caps[month])?;
    NaiveDate::from_ymd_opt(caps[year].parse().ok()?, month, caps[day].parse().ok()?)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let n = match name {
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
    Some(n)
}
