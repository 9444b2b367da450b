//! Parser for schedule patterns.
//!
//! `cronplan` uses [`ScheduleParser`] to parse schedule expressions. Invoking
//!
//! ```rust
//! # use std::str::FromStr as _;
//! #
//! # use cronplan::Schedule;
//! #
//! Schedule::from_str("0 30 12 5 1 *");
//! ```
//!
//! is equivalent to
//!
//! ```rust
//! # use cronplan::parser::ScheduleParser;
//! #
//! ScheduleParser::new().parse("0 30 12 5 1 *");
//! ```
//!
//! You can customise the parser by creating a parser builder using
//! [`ScheduleParser::builder`]. So, for example, to accept patterns padded with
//! arbitrary whitespace do something like this:
//!
//! ```rust
//! use cronplan::parser::{ScheduleParser, Separator};
//!
//! let parser = ScheduleParser::builder()
//!     .separator(Separator::Whitespace)
//!     .build();
//!
//! let schedule = parser.parse("  0  30 12 5 1 *  ").unwrap();
//! assert_eq!(schedule.to_string(), "0 30 12 5 1 *");
//! ```

use chrono::NaiveDate;
use derive_builder::Builder;
use strum::{EnumCount, EnumIs};

use crate::{
    errors::ScheduleError,
    field::{parse_field, Field, FieldSpec, FIELD_ORDER},
    pattern::SchedulePattern,
    Schedule,
};

/// Default base of the iteration caps used when searching for the next date.
pub const DEFAULT_SEARCH_ATTEMPTS: usize = 50;

/// Leap year used to decide whether an explicit month/day pair can ever occur.
pub const REFERENCE_YEAR: i32 = 2000;

/// How a pattern is split into fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum Separator {
    /// Split on every single space. Repeated spaces produce empty fields.
    #[default]
    Space,
    /// Trim the pattern and split on runs of any whitespace.
    Whitespace,
}

/// Parser for schedule patterns.
///
/// In order to build a custom parser use [`ScheduleParser::builder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Builder)]
#[builder(default, build_fn(skip), pattern = "owned")]
pub struct ScheduleParser {
    /// Configure how the pattern is split into fields.
    separator: Separator,
    /// Base of the iteration caps for the date search, at least 1.
    search_attempts: usize,
}

impl Default for ScheduleParser {
    fn default() -> Self {
        Self {
            separator: Separator::default(),
            search_attempts: DEFAULT_SEARCH_ATTEMPTS,
        }
    }
}

impl ScheduleParser {
    /// Create a new parser.
    ///
    /// You should probably be using [`Schedule`]'s implementation of
    /// [`FromStr`][std::str::FromStr] instead of invoking this.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a builder for custom parsing.
    ///
    /// Equivalent to [`ScheduleParserBuilder::default`].
    pub fn builder() -> ScheduleParserBuilder {
        ScheduleParserBuilder::default()
    }

    /// Parses the pattern string.
    ///
    /// Parsing is all-or-nothing: the first failing field, or a failing
    /// cross-field check, discards everything parsed so far.
    pub fn parse(&self, pattern: &str) -> Result<Schedule, ScheduleError> {
        let parts: Vec<&str> = if self.separator.is_space() {
            pattern.split(' ').collect()
        } else {
            pattern.split_whitespace().collect()
        };

        if parts.len() != FIELD_ORDER.len() {
            return Err(ScheduleError::FieldCount {
                expected: FIELD_ORDER.len(),
                actual: parts.len(),
            });
        }

        // Parse the individual fields, stopping at the first failure
        let fields = FIELD_ORDER
            .iter()
            .zip(&parts)
            .map(|(&field, token)| parse_field(token, field))
            .collect::<Result<Vec<FieldSpec>, _>>()?;
        let [second, minute, hour, day_of_month, month, day_of_week]: [FieldSpec; Field::COUNT] =
            fields
                .try_into()
                .map_err(|fields: Vec<FieldSpec>| ScheduleError::FieldCount {
                    expected: FIELD_ORDER.len(),
                    actual: fields.len(),
                })?;

        check_possible_dates(&day_of_month, &month)?;

        let pattern = SchedulePattern {
            pattern: parts.join(" "),
            second,
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
            search_attempts: self.search_attempts.max(1),
        };
        tracing::debug!(pattern = %pattern.as_str(), canonical = %pattern, "parsed schedule");

        Ok(Schedule { pattern })
    }
}

// Rejects explicit month/day-of-month combinations that never occur, such as
// 31 April. Skipped as soon as either field is a wildcard.
fn check_possible_dates(day_of_month: &FieldSpec, month: &FieldSpec) -> Result<(), ScheduleError> {
    let (Some(days), Some(months)) = (day_of_month.explicit(), month.explicit()) else {
        return Ok(());
    };
    for &month in months.values() {
        for &day in days.values() {
            if NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day).is_none() {
                return Err(ScheduleError::ImpossibleDate { month, day });
            }
        }
    }
    Ok(())
}

impl ScheduleParserBuilder {
    pub fn build(self) -> ScheduleParser {
        let ScheduleParserBuilder {
            separator,
            search_attempts,
        } = self;
        ScheduleParser {
            separator: separator.unwrap_or_default(),
            search_attempts: search_attempts.unwrap_or(DEFAULT_SEARCH_ATTEMPTS).max(1),
        }
    }
}
