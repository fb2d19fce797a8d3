use chrono::{
    DateTime, Datelike, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};

use crate::domains::period::types::{Period, PeriodScope, PeriodWindow};

/// Gaps in local time (DST) are scanned in steps of this size.
const GAP_STEP_MINUTES: i64 = 15;
const GAP_MAX_STEPS: i64 = 24 * 60 / GAP_STEP_MINUTES;

/// Resolve the window of `period` that contains `now`, with calendar
/// boundaries taken in `tz`.
///
/// `AllTime` is `PeriodScope::Unbounded`; callers must not substitute an
/// artificial wide range for it.
pub fn window_for<Tz: TimeZone>(period: Period, now: DateTime<Utc>, tz: &Tz) -> PeriodScope {
    let Some(months) = period.months() else {
        return PeriodScope::Unbounded;
    };
    let (local_date, saturated) = match local_date(now, tz) {
        Some(date) => (date, false),
        None => (saturated_date(now, tz), true),
    };
    let window = window_from_start(bucket_start(local_date, months), months, tz);
    if saturated {
        // The local calendar has run out; stretch the window to keep `now` inside it
        return PeriodScope::Bounded(PeriodWindow::new(window.start().min(now), window.end().max(now)));
    }
    PeriodScope::Bounded(window)
}

/// The window immediately preceding the current one at the same granularity.
///
/// Uses calendar subtraction: the month before January is December of the
/// prior year. `AllTime` has no predecessor.
pub fn previous_period<Tz: TimeZone>(period: Period, now: DateTime<Utc>, tz: &Tz) -> Option<PeriodWindow> {
    let months = period.months()?;
    let local_date = local_date(now, tz).unwrap_or_else(|| saturated_date(now, tz));
    let current_start = bucket_start(local_date, months);

    match current_start.checked_sub_months(Months::new(months)) {
        Some(previous_start) => Some(window_from_start(previous_start, months, tz)),
        None => {
            // Before the first representable period: clamp to the range floor
            let end = just_before(local_midnight(current_start, tz));
            Some(PeriodWindow::new(DateTime::<Utc>::MIN_UTC, end.max(DateTime::<Utc>::MIN_UTC)))
        }
    }
}

/// Window covering one calendar month of `year`, `month` being 1-based.
pub fn month_window<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> Option<PeriodWindow> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(window_from_start(start, 1, tz))
}

/// Window covering the whole calendar `year`.
pub fn year_window<Tz: TimeZone>(year: i32, tz: &Tz) -> Option<PeriodWindow> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    Some(window_from_start(start, 12, tz))
}

/// Calendar date of `now` in `tz`, or `None` when it lies outside chrono's range.
fn local_date<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Option<NaiveDate> {
    let utc = now.naive_utc();
    let offset = tz.offset_from_utc_datetime(&utc).fix();
    utc.checked_add_offset(offset).map(|local| local.date())
}

/// The representable date nearest to an out-of-range local date.
fn saturated_date<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    let offset = tz.offset_from_utc_datetime(&now.naive_utc()).fix();
    if offset.local_minus_utc() > 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    }
}

/// First day of the `months`-long block containing `date`.
///
/// Blocks are aligned to January: quarters are Jan-Mar, Apr-Jun, Jul-Sep, Oct-Dec.
fn bucket_start(date: NaiveDate, months: u32) -> NaiveDate {
    let block_month0 = date.month0() / months * months;
    NaiveDate::from_ymd_opt(date.year(), block_month0 + 1, 1).unwrap_or(date)
}

fn window_from_start<Tz: TimeZone>(start: NaiveDate, months: u32, tz: &Tz) -> PeriodWindow {
    let start_instant = local_midnight(start, tz);
    let end_instant = start
        .checked_add_months(Months::new(months))
        .map(|next| just_before(local_midnight(next, tz)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    PeriodWindow::new(start_instant, end_instant.max(start_instant))
}

/// Last representable instant before `instant`.
fn just_before(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .checked_sub_signed(TimeDelta::nanoseconds(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// The UTC instant of local midnight starting `date` in `tz`.
fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    resolve_local(date.and_time(NaiveTime::MIN), tz)
}

/// Map a local wall-clock time to an instant.
///
/// Ambiguous times take the earlier instant; times inside a gap move forward
/// to the first valid local time.
fn resolve_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    for step in 0..=GAP_MAX_STEPS {
        let Some(candidate) = naive.checked_add_signed(TimeDelta::minutes(step * GAP_STEP_MINUTES)) else {
            break;
        };
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(local) => return local.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => continue,
        }
    }
    // Only reachable at the edges of chrono's range
    Utc.from_utc_datetime(&naive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn bounded(scope: PeriodScope) -> PeriodWindow {
        *scope.window().expect("expected a bounded window")
    }

    #[test]
    fn test_month_window_is_inclusive_calendar_month() {
        let window = bounded(window_for(Period::Month, utc("2025-03-15T10:00:00Z"), &Utc));
        assert_eq!(window.start(), utc("2025-03-01T00:00:00Z"));
        assert_eq!(window.end(), utc("2025-03-31T23:59:59.999999999Z"));
        assert!(window.contains(utc("2025-03-31T23:59:59.999Z")));
        assert!(!window.contains(utc("2025-04-01T00:00:00Z")));
        assert!(!window.contains(utc("2025-02-28T23:59:59.999999999Z")));
    }

    #[test]
    fn test_quarter_blocks() {
        let cases = [
            ("2025-01-01T00:00:00Z", "2025-01-01T00:00:00Z", "2025-03-31T23:59:59.999999999Z"),
            ("2025-05-20T12:00:00Z", "2025-04-01T00:00:00Z", "2025-06-30T23:59:59.999999999Z"),
            ("2025-08-10T08:00:00Z", "2025-07-01T00:00:00Z", "2025-09-30T23:59:59.999999999Z"),
            ("2025-12-31T23:59:59Z", "2025-10-01T00:00:00Z", "2025-12-31T23:59:59.999999999Z"),
        ];
        for (now, start, end) in cases {
            let window = bounded(window_for(Period::Quarter, utc(now), &Utc));
            assert_eq!(window.start(), utc(start), "start for {}", now);
            assert_eq!(window.end(), utc(end), "end for {}", now);
        }
    }

    #[test]
    fn test_year_window() {
        let window = bounded(window_for(Period::Year, utc("2024-06-30T00:00:00Z"), &Utc));
        assert_eq!(window.start(), utc("2024-01-01T00:00:00Z"));
        assert_eq!(window.end(), utc("2024-12-31T23:59:59.999999999Z"));
    }

    #[test]
    fn test_all_time_is_unbounded() {
        let scope = window_for(Period::AllTime, utc("2025-03-15T10:00:00Z"), &Utc);
        assert_eq!(scope, PeriodScope::Unbounded);
        assert!(scope.contains(DateTime::<Utc>::MIN_UTC));
        assert!(previous_period(Period::AllTime, utc("2025-03-15T10:00:00Z"), &Utc).is_none());
    }

    #[test]
    fn test_previous_month_wraps_year() {
        let previous = previous_period(Period::Month, utc("2025-01-10T00:00:00Z"), &Utc).unwrap();
        assert_eq!(previous.start(), utc("2024-12-01T00:00:00Z"));
        assert_eq!(previous.end(), utc("2024-12-31T23:59:59.999999999Z"));
    }

    #[test]
    fn test_previous_month_is_calendar_aware() {
        // 31st of March: a 30-day offset would land in March again
        let previous = previous_period(Period::Month, utc("2024-03-31T12:00:00Z"), &Utc).unwrap();
        assert_eq!(previous.start(), utc("2024-02-01T00:00:00Z"));
        assert_eq!(previous.end(), utc("2024-02-29T23:59:59.999999999Z"));
    }

    #[test]
    fn test_previous_quarter_and_year() {
        let previous = previous_period(Period::Quarter, utc("2025-02-01T00:00:00Z"), &Utc).unwrap();
        assert_eq!(previous.start(), utc("2024-10-01T00:00:00Z"));
        let previous = previous_period(Period::Year, utc("2025-02-01T00:00:00Z"), &Utc).unwrap();
        assert_eq!(previous.start(), utc("2024-01-01T00:00:00Z"));
        assert_eq!(previous.end(), utc("2024-12-31T23:59:59.999999999Z"));
    }

    #[test]
    fn test_boundaries_follow_supplied_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        // Already April in +02:00
        let now = utc("2025-03-31T23:30:00Z");
        let window = bounded(window_for(Period::Month, now, &plus_two));
        assert_eq!(window.start(), utc("2025-03-31T22:00:00Z"));
        assert_eq!(window.end(), utc("2025-04-30T21:59:59.999999999Z"));

        // Same instant in UTC is still March
        let window = bounded(window_for(Period::Month, now, &Utc));
        assert_eq!(window.start(), utc("2025-03-01T00:00:00Z"));
    }

    #[test]
    fn test_month_and_year_windows() {
        let window = month_window(2025, 2, &Utc).unwrap();
        assert_eq!(window.end(), utc("2025-02-28T23:59:59.999999999Z"));
        assert!(month_window(2025, 13, &Utc).is_none());

        let year = year_window(2025, &Utc).unwrap();
        assert_eq!(year.start(), month_window(2025, 1, &Utc).unwrap().start());
        assert_eq!(year.end(), month_window(2025, 12, &Utc).unwrap().end());
    }

    #[test]
    fn test_window_saturates_at_range_end() {
        let window = bounded(window_for(Period::Year, DateTime::<Utc>::MAX_UTC, &Utc));
        assert_eq!(window.end(), DateTime::<Utc>::MAX_UTC);
        assert!(window.contains(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn test_window_saturates_with_positive_offset() {
        let plus_five = FixedOffset::east_opt(5 * 3600).unwrap();
        let now = DateTime::<Utc>::MAX_UTC;

        let window = bounded(window_for(Period::Month, now, &plus_five));
        assert!(window.start() <= window.end());
        assert_eq!(window.end(), DateTime::<Utc>::MAX_UTC);
        assert!(window.contains(now));

        let previous = previous_period(Period::Month, now, &plus_five).unwrap();
        assert!(previous.start() <= previous.end());
        assert!(previous.end() < window.start());
    }

    #[test]
    fn test_previous_period_saturates_with_negative_offset() {
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = DateTime::<Utc>::MIN_UTC;

        let previous = previous_period(Period::Month, now, &minus_five).unwrap();
        assert_eq!(previous.start(), DateTime::<Utc>::MIN_UTC);
        assert!(previous.start() <= previous.end());

        let window = bounded(window_for(Period::Month, now, &minus_five));
        assert_eq!(window.start(), DateTime::<Utc>::MIN_UTC);
        assert!(window.contains(now));
        assert!(window.start() <= window.end());
    }

    #[test]
    fn test_period_from_str_accepts_screen_labels() {
        assert_eq!(Period::from_str("This Month"), Some(Period::Month));
        assert_eq!(Period::from_str("this quarter"), Some(Period::Quarter));
        assert_eq!(Period::from_str("All Time"), Some(Period::AllTime));
        assert_eq!(Period::from_str("year"), Some(Period::Year));
        assert_eq!(Period::from_str("fortnight"), None);
    }
}
