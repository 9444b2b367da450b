//! # Cronplan
//!
//! Cronplan parses six-field, second-precision schedule expressions and computes the
//! next calendar instant that satisfies them.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use cronplan::parse_schedule;
//!
//! // 12:30:00 on the 5th of January
//! let schedule = parse_schedule("0 30 12 5 1 *").expect("Successful parsing");
//!
//! let reference = NaiveDate::from_ymd_opt(2019, 10, 7)
//!     .unwrap()
//!     .and_hms_opt(23, 20, 0)
//!     .unwrap();
//! let next = schedule.next(&reference).unwrap();
//!
//! assert_eq!(next.to_string(), "2020-01-05 12:30:00");
//! ```
//!
//! `next` is inclusive: a reference that already satisfies the schedule is returned
//! unchanged. Use [`Schedule::find_next_occurrence`] or the iterators for zoned,
//! optionally exclusive searches.
//!
//! ## Pattern
//!
//! ```text
//! ┌──────────────── second (0 - 59)
//! │ ┌────────────── minute (0 - 59)
//! │ │ ┌──────────── hour (0 - 23)
//! │ │ │ ┌────────── day of month (1 - 31)
//! │ │ │ │ ┌──────── month (1 - 12)
//! │ │ │ │ │ ┌────── day of week (0 - 6, 0 is Sunday)
//! │ │ │ │ │ │
//! * * * * * *
//! ```
//!
//! Every field is one of `*`, a single value `a`, an inclusive range `a-b` (in either
//! order) or a list `a,b,c`. Ranges and lists cannot be combined in one field.
//!
//! When the day of week is given, a day matches if it is one of the listed weekdays
//! or, when the day of month is also given, one of the listed days of the month.

mod engine;
pub mod errors;
pub mod field;
pub mod iterator;
mod numeric;
pub mod parser;
pub mod pattern;

pub use errors::ScheduleError;
use iterator::ScheduleIterator;
use parser::ScheduleParser;
use pattern::SchedulePattern;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike};

/// A parsed schedule.
///
/// Immutable once built; share it freely between threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schedule {
    pub pattern: SchedulePattern, // Parsed schedule pattern
}

impl Schedule {
    /// Checks whether `time` satisfies all six fields.
    ///
    /// Any fraction of a second is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use cronplan::parse_schedule;
    ///
    /// let schedule = parse_schedule("0 0 9 1 1 *").unwrap();
    /// let time = NaiveDate::from_ymd_opt(2023, 1, 1)
    ///     .unwrap()
    ///     .and_hms_opt(9, 0, 0)
    ///     .unwrap();
    ///
    /// assert!(schedule.is_time_matching(&time));
    /// ```
    pub fn is_time_matching(&self, time: &NaiveDateTime) -> bool {
        self.pattern.time_match(time) && self.pattern.day_match(time.date())
    }

    /// Finds the earliest instant at or after `reference` that satisfies the schedule.
    ///
    /// A reference with a fraction of a second is first rounded up to the next whole
    /// second.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::SearchExhausted`] when the bounded date search gives up, or
    /// when the calendar runs out.
    pub fn next(&self, reference: &NaiveDateTime) -> Result<NaiveDateTime, ScheduleError> {
        engine::next_occurrence(&self.pattern, reference)
    }

    /// Plans the next `count` occurrences starting at `from`, which is included if it
    /// matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use cronplan::parse_schedule;
    ///
    /// let schedule = parse_schedule("0 0 12 * * 1").unwrap();
    /// let from = NaiveDate::from_ymd_opt(2024, 1, 1)
    ///     .unwrap()
    ///     .and_hms_opt(0, 0, 0)
    ///     .unwrap();
    ///
    /// let mondays = schedule.upcoming(&from, 3).unwrap();
    /// assert_eq!(mondays[2].to_string(), "2024-01-15 12:00:00");
    /// ```
    pub fn upcoming(
        &self,
        from: &NaiveDateTime,
        count: usize,
    ) -> Result<Vec<NaiveDateTime>, ScheduleError> {
        let mut planned = Vec::with_capacity(count);
        let mut reference = *from;
        for _ in 0..count {
            let found = self.next(&reference)?;
            planned.push(found);
            reference = found
                .checked_add_signed(Duration::seconds(1))
                .ok_or_else(|| self.exhausted())?;
        }
        Ok(planned)
    }

    /// Finds the next occurrence in the time zone of `start_time`. If `inclusive` is
    /// `true`, `start_time` itself is a candidate; otherwise the search starts at the
    /// next whole second.
    ///
    /// The schedule is evaluated against local wall-clock time. Local times skipped by
    /// a daylight saving transition never occur, so the search continues after them.
    /// A local time that occurs twice resolves to its earliest mapping that is not
    /// before `start_time`.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::SearchExhausted`] when no occurrence is found within the
    /// schedule's search attempts.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use cronplan::parse_schedule;
    ///
    /// let schedule = parse_schedule("59 59 23 * * *").unwrap();
    /// let time = Utc.with_ymd_and_hms(2023, 3, 14, 23, 59, 59).unwrap();
    ///
    /// assert_eq!(schedule.find_next_occurrence(&time, true).unwrap(), time);
    /// assert_eq!(
    ///     schedule.find_next_occurrence(&time, false).unwrap(),
    ///     Utc.with_ymd_and_hms(2023, 3, 15, 23, 59, 59).unwrap()
    /// );
    /// ```
    pub fn find_next_occurrence<Tz: TimeZone>(
        &self,
        start_time: &DateTime<Tz>,
        inclusive: bool,
    ) -> Result<DateTime<Tz>, ScheduleError> {
        let timezone = start_time.timezone();
        let mut naive_time = start_time.naive_local();

        if !inclusive {
            naive_time = naive_time
                .with_nanosecond(0)
                .and_then(|time| time.checked_add_signed(Duration::seconds(1)))
                .ok_or_else(|| self.exhausted())?;
        }

        for _ in 0..self.pattern.search_attempts() {
            let found = self.next(&naive_time)?;

            match timezone.from_local_datetime(&found) {
                LocalResult::Single(found) => return Ok(found),
                LocalResult::Ambiguous(earliest, latest) => {
                    let usable = earliest > *start_time || (inclusive && earliest == *start_time);
                    return Ok(if usable { earliest } else { latest });
                }
                LocalResult::None => {
                    naive_time = skip_gap(&timezone, found).ok_or_else(|| self.exhausted())?;
                    tracing::trace!(
                        local = %found,
                        resumed = %naive_time,
                        "local time does not exist, searching past it"
                    );
                }
            }
        }

        Err(self.exhausted())
    }

    /// Creates a [`ScheduleIterator`] starting from the specified time.
    ///
    /// The iterator yields `start_from` first if it matches.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use cronplan::parse_schedule;
    ///
    /// let schedule = parse_schedule("0 0 * * * *").unwrap();
    /// let start = Utc.with_ymd_and_hms(2023, 1, 1, 5, 0, 0).unwrap();
    ///
    /// let hours: Vec<_> = schedule.iter_from(start).take(3).collect();
    /// assert_eq!(hours[0], start);
    /// ```
    pub fn iter_from<Tz>(&self, start_from: DateTime<Tz>) -> ScheduleIterator<Tz>
    where
        Tz: TimeZone,
    {
        ScheduleIterator::new(self.clone(), start_from, true)
    }

    /// Creates a [`ScheduleIterator`] that only yields times strictly after
    /// `start_after`.
    pub fn iter_after<Tz>(&self, start_after: DateTime<Tz>) -> ScheduleIterator<Tz>
    where
        Tz: TimeZone,
    {
        ScheduleIterator::new(self.clone(), start_after, false)
    }

    /// The pattern as it was parsed, fields joined by single spaces.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    fn exhausted(&self) -> ScheduleError {
        ScheduleError::SearchExhausted {
            pattern: self.as_str().to_string(),
            attempts: self.pattern.search_attempts(),
        }
    }
}

// Longest local-time gap scanned for, in minutes. The largest ever recorded is a
// skipped calendar day.
const MAX_GAP_MINUTES: u32 = 2 * 24 * 60;

// First existing local time after the gap that swallows `local`. The gap is
// scanned by whole minutes, then narrowed back to the second.
fn skip_gap<Tz: TimeZone>(timezone: &Tz, local: NaiveDateTime) -> Option<NaiveDateTime> {
    let exists = |time: &NaiveDateTime| {
        !matches!(timezone.from_local_datetime(time), LocalResult::None)
    };

    let mut candidate = local.with_second(0)?;
    for _ in 0..MAX_GAP_MINUTES {
        candidate = candidate.checked_add_signed(Duration::minutes(1))?;
        if !exists(&candidate) {
            continue;
        }
        let mut gap_end = candidate;
        while let Some(earlier) = gap_end.checked_sub_signed(Duration::seconds(1)) {
            if earlier <= local || !exists(&earlier) {
                break;
            }
            gap_end = earlier;
        }
        return Some(gap_end);
    }
    None
}

/// Parses `text` with the default [`ScheduleParser`].
///
/// # Errors
///
/// The first problem found, in field order, followed by the impossible date check.
pub fn parse_schedule(text: &str) -> Result<Schedule, ScheduleError> {
    ScheduleParser::new().parse(text)
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        parse_schedule(pattern)
    }
}

impl fmt::Display for Schedule {
    /// Writes the canonical form, which parses back to an equal schedule.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{
        de::{self, Visitor},
        Deserialize, Deserializer, Serialize, Serializer,
    };

    impl Serialize for Schedule {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&self.to_string())
        }
    }

    struct ScheduleVisitor;

    impl Visitor<'_> for ScheduleVisitor {
        type Value = Schedule;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a six-field schedule pattern")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Schedule::from_str(value).map_err(E::custom)
        }
    }

    impl<'de> Deserialize<'de> for Schedule {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_str(ScheduleVisitor)
        }
    }
}
