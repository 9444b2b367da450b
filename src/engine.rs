use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::errors::ScheduleError;
use crate::field::{Field, FieldSpec, ValueSet};
use crate::pattern::SchedulePattern;

/// Time of day chosen for the reference date, and whether none was left so the
/// search has to continue on the following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimeResolution {
    pub time: NaiveTime,
    pub day_carry: bool,
}

// Finds the earliest instant at or after `reference` matching every field.
pub(crate) fn next_occurrence(
    pattern: &SchedulePattern,
    reference: &NaiveDateTime,
) -> Result<NaiveDateTime, ScheduleError> {
    let reference = whole_second_ceiling(reference)
        .ok_or_else(|| exhausted(pattern, pattern.search_attempts()))?;

    let resolved = resolve_time(pattern, reference.time())
        .ok_or_else(|| exhausted(pattern, pattern.search_attempts()))?;
    let start = if resolved.day_carry {
        reference
            .date()
            .succ_opt()
            .ok_or_else(|| exhausted(pattern, pattern.search_attempts()))?
    } else {
        reference.date()
    };

    let date = resolve_date(pattern, start)?;

    // Any later day starts from the earliest time of day
    let time = if date == reference.date() {
        resolved.time
    } else {
        earliest_time(pattern).ok_or_else(|| exhausted(pattern, pattern.search_attempts()))?
    };
    Ok(date.and_time(time))
}

// Sub-second precision is not supported, round up so the result never precedes the reference.
fn whole_second_ceiling(time: &NaiveDateTime) -> Option<NaiveDateTime> {
    if time.nanosecond() == 0 {
        return Some(*time);
    }
    time.with_nanosecond(0)?
        .checked_add_signed(Duration::seconds(1))
}

/// Picks the smallest (hour, minute, second) at or after `reference`.
///
/// Hours are walked from the reference hour upwards. While the hour equals the
/// reference hour the minute candidates start at the reference minute, and likewise
/// for seconds; once a larger unit has moved forward the smaller ones restart at
/// their minimum. When every candidate is exhausted the earliest time of day is
/// returned with `day_carry` set. `None` only if no valid time of day can be built.
pub(crate) fn resolve_time(
    pattern: &SchedulePattern,
    reference: NaiveTime,
) -> Option<TimeResolution> {
    let minute_domain = Field::Minute.domain();
    let second_domain = Field::Second.domain();

    for hour in pattern
        .hour
        .candidates(reference.hour(), Field::Hour.domain())
    {
        let same_hour = hour == reference.hour();
        let minute_floor = if same_hour {
            reference.minute()
        } else {
            minute_domain.min
        };

        for minute in pattern.minute.candidates(minute_floor, minute_domain) {
            let second_floor = if same_hour && minute == reference.minute() {
                reference.second()
            } else {
                second_domain.min
            };

            let time = pattern
                .second
                .first_at_or_after(second_floor, second_domain)
                .and_then(|second| NaiveTime::from_hms_opt(hour, minute, second));
            if let Some(time) = time {
                return Some(TimeResolution {
                    time,
                    day_carry: false,
                });
            }
        }
    }

    tracing::trace!(reference = %reference, "no time of day left, carrying into the next day");
    Some(TimeResolution {
        time: earliest_time(pattern)?,
        day_carry: true,
    })
}

fn earliest_time(pattern: &SchedulePattern) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(
        pattern.hour.min(Field::Hour.domain()),
        pattern.minute.min(Field::Minute.domain()),
        pattern.second.min(Field::Second.domain()),
    )
}

/// Finds the first date at or after `start` that satisfies the date fields.
pub(crate) fn resolve_date(
    pattern: &SchedulePattern,
    start: NaiveDate,
) -> Result<NaiveDate, ScheduleError> {
    match &pattern.day_of_week {
        FieldSpec::Wildcard(_) => walk_calendar(pattern, start),
        FieldSpec::Explicit(weekdays) => walk_weekdays(pattern, weekdays, start),
    }
}

// Without a weekday constraint: jump to the next allowed month, then to the next
// allowed day within it. A day missing from a short month (31 in April, 29 in
// February of a common year) moves on to the next allowed month.
fn walk_calendar(pattern: &SchedulePattern, start: NaiveDate) -> Result<NaiveDate, ScheduleError> {
    let attempts = pattern.search_attempts();
    let day_domain = Field::DayOfMonth.domain();
    let mut date = start;

    for _ in 0..attempts {
        if !pattern.month.matches(date.month()) {
            date = advance_month(pattern, date.year(), date.month())
                .ok_or_else(|| exhausted(pattern, attempts))?;
        }

        let found = pattern
            .day_of_month
            .first_at_or_after(date.day(), day_domain)
            .and_then(|day| date.with_day(day));
        if let Some(found) = found {
            return Ok(found);
        }

        date = advance_month(pattern, date.year(), date.month() + 1)
            .ok_or_else(|| exhausted(pattern, attempts))?;
        tracing::trace!(%date, "no allowed day left in month, moving on");
    }

    Err(exhausted(pattern, attempts))
}

// With a weekday constraint: step one day at a time, skipping whole months that are
// not allowed. A day qualifies if its weekday is listed, or if its day-of-month is
// listed explicitly.
fn walk_weekdays(
    pattern: &SchedulePattern,
    weekdays: &ValueSet,
    start: NaiveDate,
) -> Result<NaiveDate, ScheduleError> {
    let attempts = pattern.search_attempts() * distinct_date_values(pattern).max(1);
    let mut date = start;

    for _ in 0..attempts {
        if !pattern.month.matches(date.month()) {
            date = advance_month(pattern, date.year(), date.month())
                .ok_or_else(|| exhausted(pattern, attempts))?;
            tracing::trace!(%date, "skipped to next allowed month");
            continue;
        }

        let weekday_hit = weekdays.contains(date.weekday().num_days_from_sunday());
        let day_hit = pattern
            .day_of_month
            .explicit()
            .is_some_and(|days| days.contains(date.day()));
        if weekday_hit || day_hit {
            return Ok(date);
        }

        date = date
            .succ_opt()
            .ok_or_else(|| exhausted(pattern, attempts))?;
    }

    Err(exhausted(pattern, attempts))
}

// First day of the first allowed month `>= month` in `year`, carrying into the
// next year when none is left. `month` may be 13.
fn advance_month(pattern: &SchedulePattern, year: i32, month: u32) -> Option<NaiveDate> {
    let domain = Field::Month.domain();
    match pattern.month.first_at_or_after(month, domain) {
        Some(next) => NaiveDate::from_ymd_opt(year, next, 1),
        None => NaiveDate::from_ymd_opt(year.checked_add(1)?, pattern.month.min(domain), 1),
    }
}

/// Number of explicit values across the date fields, scaling the weekday search cap.
pub(crate) fn distinct_date_values(pattern: &SchedulePattern) -> usize {
    [Field::DayOfMonth, Field::Month, Field::DayOfWeek]
        .into_iter()
        .filter_map(|field| pattern.field(field).explicit())
        .map(ValueSet::len)
        .sum()
}

fn exhausted(pattern: &SchedulePattern, attempts: usize) -> ScheduleError {
    tracing::debug!(pattern = %pattern.as_str(), attempts, "search for next occurrence exhausted");
    ScheduleError::SearchExhausted {
        pattern: pattern.as_str().to_string(),
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use rstest::rstest;

    use super::*;
    use crate::parser::ScheduleParser;
    use crate::Schedule;

    fn parse(pattern: &str) -> SchedulePattern {
        Schedule::from_str(pattern).unwrap().pattern
    }

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn time(hour: u32, minute: u32, second: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, second).unwrap()
    }

    #[rstest]
    #[case("55 46-50 16-20 * * *", time(16, 35, 0), time(16, 46, 55), false)]
    #[case("55 46-50 16-20 * * *", time(16, 51, 0), time(17, 46, 55), false)]
    #[case("55 46-50 16-20 * * *", time(20, 48, 53), time(20, 48, 55), false)]
    #[case("55 46-50 16-20 * * *", time(21, 8, 6), time(16, 46, 55), true)]
    #[case("0,40 7 * * * *", time(10, 5, 30), time(10, 7, 0), false)]
    #[case("0,40 * * * * *", time(10, 5, 50), time(10, 6, 0), false)]
    #[case("* * * * * *", time(23, 59, 59), time(23, 59, 59), false)]
    #[case("0 0 0 * * *", time(0, 0, 1), time(0, 0, 0), true)]
    #[case("59 59 23 * * *", time(23, 59, 59), time(23, 59, 59), false)]
    #[case("0 30 12 * * *", time(23, 20, 0), time(12, 30, 0), true)]
    fn test_resolve_time(
        #[case] pattern: &str,
        #[case] reference: NaiveTime,
        #[case] expected: NaiveTime,
        #[case] day_carry: bool,
    ) {
        assert_eq!(
            resolve_time(&parse(pattern), reference),
            Some(TimeResolution {
                time: expected,
                day_carry
            })
        );
    }

    #[rstest]
    // Next allowed month is in the following year
    #[case("0 0 0 5 1 *", (2019, 10, 8), (2020, 1, 5))]
    // Day 31 is skipped in November
    #[case("0 0 0 31 11,12 *", (2019, 10, 30), (2019, 12, 31))]
    // 29 February only in leap years
    #[case("0 0 0 29 2 *", (2097, 3, 1), (2104, 2, 29))]
    #[case("0 0 0 * * *", (2019, 10, 8), (2019, 10, 8))]
    #[case("0 0 0 15 * *", (2019, 12, 16), (2020, 1, 15))]
    fn test_resolve_date_without_weekday(
        #[case] pattern: &str,
        #[case] start: (i32, u32, u32),
        #[case] expected: (i32, u32, u32),
    ) {
        let start = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        let expected = NaiveDate::from_ymd_opt(expected.0, expected.1, expected.2).unwrap();
        assert_eq!(resolve_date(&parse(pattern), start), Ok(expected));
    }

    #[rstest]
    // 2019-10-07 is a Monday; the Thursday after is also the 10th
    #[case("0 0 0 10 * 4", (2019, 10, 7), (2019, 10, 10))]
    // Either a Tuesday or the 10th/11th, Tuesday comes first
    #[case("0 0 0 10,11 * 2", (2019, 10, 8), (2019, 10, 8))]
    // First allowed month is February 2020, whose 4th is a Tuesday
    #[case("0 0 0 20-21 2-4 2-4", (2019, 10, 28), (2020, 2, 4))]
    // 1 March 2020 is a Sunday but matches the day-of-month
    #[case("0 0 0 1-2 3-8 2", (2019, 10, 1), (2020, 3, 1))]
    // Only the weekday matters when the day-of-month is a wildcard
    #[case("0 0 0 * 12 5", (2019, 1, 1), (2019, 12, 6))]
    fn test_resolve_date_with_weekday(
        #[case] pattern: &str,
        #[case] start: (i32, u32, u32),
        #[case] expected: (i32, u32, u32),
    ) {
        let start = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        let expected = NaiveDate::from_ymd_opt(expected.0, expected.1, expected.2).unwrap();
        assert_eq!(resolve_date(&parse(pattern), start), Ok(expected));
    }

    #[test]
    fn test_next_occurrence_rounds_up_fractions() {
        let pattern = parse("* * * * * *");
        let reference = at(2019, 10, 27, 22, 39, 16)
            .with_nanosecond(55)
            .unwrap();
        assert_eq!(
            next_occurrence(&pattern, &reference),
            Ok(at(2019, 10, 27, 22, 39, 17))
        );
    }

    #[test]
    fn test_next_occurrence_resets_time_on_later_day() {
        // Time of day fits on the reference date, but the date does not
        let pattern = parse("5 33 15 31 11,12 *");
        assert_eq!(
            next_occurrence(&pattern, &at(2019, 10, 30, 0, 0, 1)),
            Ok(at(2019, 12, 31, 15, 33, 5))
        );
    }

    #[test]
    fn test_next_occurrence_carries_through_year_end() {
        let pattern = parse("0 0 0 1 1 *");
        assert_eq!(
            next_occurrence(&pattern, &at(2023, 12, 31, 23, 59, 59)),
            Ok(at(2024, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_small_search_cap_is_exhausted() {
        let pattern = ScheduleParser::builder()
            .search_attempts(1)
            .build()
            .parse("0 0 0 29 2 *")
            .unwrap()
            .pattern;
        assert_eq!(
            next_occurrence(&pattern, &at(2097, 3, 1, 0, 0, 0)),
            Err(ScheduleError::SearchExhausted {
                pattern: "0 0 0 29 2 *".to_string(),
                attempts: 1,
            })
        );
    }

    #[rstest]
    // One explicit date value, so a single step; Monday is not a Sunday
    #[case("0 0 0 * * 0", 1, 1)]
    // Three explicit date values: Monday 7th to Wednesday 9th, none a Sunday or the 10th/11th
    #[case("0 0 0 10,11 * 0", 1, 3)]
    fn test_weekday_search_cap_is_exhausted(
        #[case] text: &str,
        #[case] search_attempts: usize,
        #[case] attempts: usize,
    ) {
        let pattern = ScheduleParser::builder()
            .search_attempts(search_attempts)
            .build()
            .parse(text)
            .unwrap()
            .pattern;
        // 2019-10-07 is a Monday
        assert_eq!(
            next_occurrence(&pattern, &at(2019, 10, 7, 0, 0, 0)),
            Err(ScheduleError::SearchExhausted {
                pattern: text.to_string(),
                attempts,
            })
        );
    }

    #[test]
    fn test_weekday_search_cap_scales_with_date_values() {
        // Cap 2 with three date values allows six steps, enough to reach the 10th
        let pattern = ScheduleParser::builder()
            .search_attempts(2)
            .build()
            .parse("0 0 0 10,11 * 0")
            .unwrap()
            .pattern;
        assert_eq!(
            next_occurrence(&pattern, &at(2019, 10, 7, 0, 0, 0)),
            Ok(at(2019, 10, 10, 0, 0, 0))
        );
    }

    #[test]
    fn test_end_of_calendar_is_exhausted() {
        let pattern = parse("0 0 0 1 1 *");
        let reference = NaiveDate::MAX.and_hms_opt(0, 0, 1).unwrap();
        assert!(matches!(
            next_occurrence(&pattern, &reference),
            Err(ScheduleError::SearchExhausted { .. })
        ));
    }

    #[test]
    fn test_distinct_date_values() {
        assert_eq!(distinct_date_values(&parse("0 0 0 10,11 3-5 2")), 6);
        assert_eq!(distinct_date_values(&parse("0 0 0 * * *")), 0);
    }
}
