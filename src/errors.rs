use thiserror::Error;

use crate::field::Field;

/// Represents errors that can occur while parsing schedules and searching for occurrences.
///
/// `ScheduleError` is used throughout the `cronplan` crate and is exported for
/// consuming programs to use. Nothing in the crate aborts on these conditions; they
/// are always handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The pattern did not split into the expected number of fields.
    ///
    /// Fields are separated by a single space, so doubled or trailing spaces count
    /// as extra (empty) fields unless the parser is configured otherwise.
    #[error("incorrect number of fields, expected {expected} got {actual}")]
    FieldCount { expected: usize, actual: usize },

    /// A range token did not consist of exactly two values separated by `-`.
    #[error("incorrect format of range `{token}`, expected 2 values separated by `-`, got {parts}")]
    RangeFormat { token: String, parts: usize },

    /// A (sub-)token could not be converted to an integer.
    #[error("unable to convert `{token}` to an integer")]
    NumericParse { token: String },

    /// The smallest or largest value of a field lies outside the field's domain.
    #[error(
        "{field} expects numbers between {min}-{max}, got {found_min}-{found_max} from `{token}`"
    )]
    DomainRange {
        field: Field,
        min: u32,
        max: u32,
        found_min: u32,
        found_max: u32,
        token: String,
    },

    /// An explicit month and day-of-month combination that never occurs, such as 30 February.
    #[error("month {month} never has a day {day}")]
    ImpossibleDate { month: u32, day: u32 },

    /// The bounded search gave up before finding an instant satisfying the schedule.
    ///
    /// Also returned when the search would step past the calendar range representable
    /// by `chrono`.
    #[error("no instant satisfying `{pattern}` found within {attempts} attempts")]
    SearchExhausted { pattern: String, attempts: usize },
}
