//! Date predicate parsing and matching.
//!
//! ## Supported Syntax
//!
//! - `YYYY-MM-DD` absolute calendar day
//! - `+Nd` / `-Nd` day offset from today, resolved at evaluation time
//!
//! Both forms name a whole local calendar day. Comparisons use the day
//! bounds: `=` matches anywhere inside the day, `<` before its first
//! instant, `>` after its last.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::comparator::Comparator;

/// An absolute or relative calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateExpr {
    Absolute(NaiveDate),
    Relative { days: i64 },
}

impl DateExpr {
    /// Parses `YYYY-MM-DD` or `[+-]Nd`. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        parse_relative_days(trimmed)
            .map(|days| Self::Relative { days })
            .or_else(|| parse_absolute_date(trimmed).map(Self::Absolute))
    }

    /// Resolves to a calendar day relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Absolute(date) => Some(*date),
            Self::Relative { days } => {
                Duration::try_days(*days).and_then(|delta| today.checked_add_signed(delta))
            }
        }
    }
}

impl fmt::Display for DateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Relative { days } => write!(f, "{days:+}d"),
        }
    }
}

/// A comparator applied to a date expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatePredicate {
    comparator: Comparator,
    expr: DateExpr,
}

impl DatePredicate {
    pub fn new(comparator: Comparator, expr: DateExpr) -> Self {
        Self { comparator, expr }
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn expr(&self) -> DateExpr {
        self.expr
    }

    /// Checks an instant against the predicate, with relative days counted
    /// from `today`.
    pub fn matches(&self, instant: DateTime<Utc>, today: NaiveDate) -> bool {
        let Some(day) = self.expr.resolve(today) else {
            return false;
        };
        let (start, end) = day_bounds(day);
        let inside = instant >= start && instant < end;
        match self.comparator {
            Comparator::Eq => inside,
            Comparator::Ne => !inside,
            Comparator::Lt => instant < start,
            Comparator::Lte => instant < end,
            Comparator::Gt => instant >= end,
            Comparator::Gte => instant >= start,
        }
    }
}

impl fmt::Display for DatePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparator, self.expr)
    }
}

/// Parses a node-side attribute value into an instant.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (or with a space) in local time,
/// and plain `YYYY-MM-DD`, which maps to local midnight.
pub fn parse_attribute_instant(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(local_to_utc(naive));
        }
    }
    parse_absolute_date(trimmed).map(|date| day_bounds(date).0)
}

/// Returns `[start, end)` of a local calendar day.
fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_to_utc(date.and_time(NaiveTime::MIN));
    let end = date
        .succ_opt()
        .map(|next| local_to_utc(next.and_time(NaiveTime::MIN)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Skipped by a DST transition; treat the wall time as UTC.
        None => naive.and_utc(),
    }
}

fn parse_relative_days(raw: &str) -> Option<i64> {
    let sign = match raw.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = raw[1..].strip_suffix(['d', 'D'])?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().map(|days| sign * days)
}

fn parse_absolute_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_absolute_and_relative() {
        assert_eq!(
            DateExpr::parse("2024-06-15"),
            Some(DateExpr::Absolute(date(2024, 6, 15)))
        );
        assert_eq!(DateExpr::parse("-7d"), Some(DateExpr::Relative { days: -7 }));
        assert_eq!(DateExpr::parse("+3d"), Some(DateExpr::Relative { days: 3 }));
        assert_eq!(DateExpr::parse("+0D"), Some(DateExpr::Relative { days: 0 }));
    }

    #[test]
    fn out_of_range_offsets_resolve_to_nothing() {
        let expr = DateExpr::parse("+999999999999d").unwrap();
        assert_eq!(expr.resolve(date(2024, 1, 1)), None);
        let predicate = DatePredicate::new(Comparator::Lt, expr);
        assert!(!predicate.matches(Utc::now(), date(2024, 1, 1)));
    }

    #[test]
    fn parse_rejects_other_shapes() {
        for raw in ["", "7d", "-d", "-7", "-7w", "2024-6-15", "2024-13-01", "2024/06/15", "today"] {
            assert_eq!(DateExpr::parse(raw), None, "{raw:?} should not parse");
        }
    }

    #[test]
    fn equality_is_day_granular() {
        let predicate = DatePredicate::new(Comparator::Eq, DateExpr::Absolute(date(2024, 6, 15)));
        let today = date(2030, 1, 1);
        assert!(predicate.matches(local(2024, 6, 15, 0), today));
        assert!(predicate.matches(local(2024, 6, 15, 23), today));
        assert!(!predicate.matches(local(2024, 6, 16, 0), today));
        assert!(!predicate.matches(local(2024, 6, 14, 23), today));
    }

    #[test]
    fn ordering_uses_day_bounds() {
        let day = DateExpr::Absolute(date(2024, 1, 1));
        let today = date(2030, 1, 1);
        let noon = local(2024, 1, 1, 12);
        let before = local(2023, 12, 31, 12);
        let after = local(2024, 1, 2, 12);

        let gt = DatePredicate::new(Comparator::Gt, day);
        assert!(!gt.matches(noon, today));
        assert!(gt.matches(after, today));

        let gte = DatePredicate::new(Comparator::Gte, day);
        assert!(gte.matches(noon, today));
        assert!(!gte.matches(before, today));

        let lt = DatePredicate::new(Comparator::Lt, day);
        assert!(lt.matches(before, today));
        assert!(!lt.matches(noon, today));

        let lte = DatePredicate::new(Comparator::Lte, day);
        assert!(lte.matches(noon, today));
        assert!(!lte.matches(after, today));

        let ne = DatePredicate::new(Comparator::Ne, day);
        assert!(ne.matches(before, today));
        assert!(!ne.matches(noon, today));
    }

    #[test]
    fn relative_days_resolve_against_today() {
        let today = date(2024, 6, 15);
        let yesterday = DatePredicate::new(Comparator::Eq, DateExpr::Relative { days: -1 });
        assert!(yesterday.matches(local(2024, 6, 14, 10), today));
        assert!(!yesterday.matches(local(2024, 6, 15, 10), today));

        let last_week = DatePredicate::new(Comparator::Gte, DateExpr::Relative { days: -7 });
        assert!(last_week.matches(local(2024, 6, 8, 0), today));
        assert!(!last_week.matches(local(2024, 6, 7, 23), today));
    }

    #[test]
    fn attribute_instants() {
        assert_eq!(parse_attribute_instant("2024-06-15"), Some(local(2024, 6, 15, 0)));
        assert_eq!(
            parse_attribute_instant("2024-06-15T09:00"),
            Some(local(2024, 6, 15, 9))
        );
        assert_eq!(
            parse_attribute_instant("2024-06-15T09:00:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap())
        );
        assert_eq!(parse_attribute_instant("soon"), None);
    }

    #[test]
    fn display_forms() {
        let absolute = DatePredicate::new(Comparator::Gte, DateExpr::Absolute(date(2024, 1, 5)));
        assert_eq!(absolute.to_string(), ">=2024-01-05");
        let relative = DatePredicate::new(Comparator::Lt, DateExpr::Relative { days: -7 });
        assert_eq!(relative.to_string(), "<-7d");
        let forward = DatePredicate::new(Comparator::Eq, DateExpr::Relative { days: 2 });
        assert_eq!(forward.to_string(), "=+2d");
    }
}
