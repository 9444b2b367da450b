use crate::{errors::ScheduleError, Schedule};
use chrono::{DateTime, TimeZone};

/// Yields successive occurrences of a [`Schedule`].
///
/// Created by [`Schedule::iter_from`] and [`Schedule::iter_after`]. The iterator ends
/// when the bounded search gives up.
#[derive(Debug, Clone)]
pub struct ScheduleIterator<Tz>
where
    Tz: TimeZone,
{
    schedule: Schedule,
    current_time: DateTime<Tz>,
    inclusive: bool,
}

impl<Tz> ScheduleIterator<Tz>
where
    Tz: TimeZone,
{
    /// Creates a new `ScheduleIterator`.
    ///
    /// # Arguments
    ///
    /// * `schedule` - The schedule to evaluate.
    /// * `start_time` - The `DateTime` to start iterating from.
    /// * `inclusive` - Whether `start_time` itself is yielded when it matches.
    pub fn new(schedule: Schedule, start_time: DateTime<Tz>, inclusive: bool) -> Self {
        ScheduleIterator {
            schedule,
            current_time: start_time,
            inclusive,
        }
    }
}

impl<Tz> Iterator for ScheduleIterator<Tz>
where
    Tz: TimeZone,
{
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        match self
            .schedule
            .find_next_occurrence(&self.current_time, self.inclusive)
        {
            Ok(found) => {
                // Later searches start strictly after the last yielded occurrence
                self.current_time = found.clone();
                self.inclusive = false;
                Some(found)
            }
            Err(ScheduleError::SearchExhausted { .. }) => None,
            Err(error) => {
                tracing::warn!(%error, "schedule iterator stopped");
                None
            }
        }
    }
}
