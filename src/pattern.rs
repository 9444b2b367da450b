use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::field::{Field, FieldSpec};

// Validated representation of a six-field schedule. Built only by the parser.
#[derive(Debug, Clone, Eq)]
pub struct SchedulePattern {
    pub(crate) pattern: String, // The original pattern
    //
    pub second: FieldSpec,       // -
    pub minute: FieldSpec,       // --
    pub hour: FieldSpec,         // --- Each unit of the expression, either a
    pub day_of_month: FieldSpec, // --- wildcard or an explicit ascending set
    pub month: FieldSpec,        // --
    pub day_of_week: FieldSpec,  // -

    // Base of the iteration caps used by the date search
    pub(crate) search_attempts: usize,
}

impl SchedulePattern {
    /// The field stored for `field`.
    pub fn field(&self, field: Field) -> &FieldSpec {
        match field {
            Field::Second => &self.second,
            Field::Minute => &self.minute,
            Field::Hour => &self.hour,
            Field::DayOfMonth => &self.day_of_month,
            Field::Month => &self.month,
            Field::DayOfWeek => &self.day_of_week,
        }
    }

    /// Base of the bounded date search.
    pub fn search_attempts(&self) -> usize {
        self.search_attempts
    }

    // Checks a calendar day against the date fields.
    //
    // With an explicit day-of-week the two day fields are OR-ed, unless
    // day-of-month is a wildcard, in which case only the weekday counts.
    pub fn day_match(&self, date: NaiveDate) -> bool {
        if !self.month.matches(date.month()) {
            return false;
        }
        match &self.day_of_week {
            FieldSpec::Wildcard(_) => self.day_of_month.matches(date.day()),
            FieldSpec::Explicit(weekdays) => {
                weekdays.contains(date.weekday().num_days_from_sunday())
                    || self
                        .day_of_month
                        .explicit()
                        .is_some_and(|days| days.contains(date.day()))
            }
        }
    }

    pub fn time_match(&self, time: &NaiveDateTime) -> bool {
        self.second.matches(time.second())
            && self.minute.matches(time.minute())
            && self.hour.matches(time.hour())
    }

    // Get a reference to the original pattern
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for SchedulePattern {
    /// Writes the canonical form of the pattern, which parses back to an equal pattern.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.second,
            self.minute,
            self.hour,
            self.day_of_month,
            self.month,
            self.day_of_week
        )
    }
}

impl PartialEq for SchedulePattern {
    /// Checks for functional equality between two patterns.
    ///
    /// The original pattern string is ignored, so `"0 5-2 * * * *"` equals
    /// `"0 2-5 * * * *"`.
    fn eq(&self, other: &Self) -> bool {
        self.second == other.second
            && self.minute == other.minute
            && self.hour == other.hour
            && self.day_of_month == other.day_of_month
            && self.month == other.month
            && self.day_of_week == other.day_of_week
            && self.search_attempts == other.search_attempts
    }
}

impl Hash for SchedulePattern {
    // Consistent with `PartialEq`: the original string is left out.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.second.hash(state);
        self.minute.hash(state);
        self.hour.hash(state);
        self.day_of_month.hash(state);
        self.month.hash(state);
        self.day_of_week.hash(state);
        self.search_attempts.hash(state);
    }
}
