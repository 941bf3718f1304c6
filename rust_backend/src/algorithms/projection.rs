//! End date projection against a resource calendar.
//!
//! Projecting a task's end is a fixed-point problem: the remaining work is
//! spread over the resource's weekday capacity, but the longer the task runs
//! the more unavailable periods it may cross, and every crossed period adds
//! back the capacity it blocks. The projector alternates the two steps until
//! the unavailable minutes stop changing.
//!
//! The unavailable total can only grow with the window and is bounded by the
//! sum over all configured periods, so the loop ends after at most one
//! iteration per unavailable period plus one.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::calendar::{ResourceCalendar, ResourceCalendarProvider};
use crate::models::macros::ResourceId;
use crate::models::time::{advance_weeks, day_fraction, next_day, Timestamp};

/// Result of projecting one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Instant at which the remaining work (plus blocked capacity) is done.
    pub task_end: Timestamp,
    /// Work minutes blocked by unavailable periods inside `[start, task_end]`.
    pub unavailable_minutes: i64,
    /// Number of raw end computations performed (0 when nothing remains).
    pub iterations: u32,
}

impl Projection {
    fn immediate(start: Timestamp) -> Self {
        Self {
            task_end: start,
            unavailable_minutes: 0,
            iterations: 0,
        }
    }
}

/// Projects task end dates for a single resource.
#[derive(Debug, Clone, Copy)]
pub struct EndDateProjector<'a> {
    calendar: &'a ResourceCalendar,
}

impl<'a> EndDateProjector<'a> {
    /// Creates a projector for `calendar`.
    ///
    /// # Errors
    /// Returns `ScheduleError::NonTerminatingProjection` when the calendar
    /// has no working minutes on any weekday: day stepping would never
    /// consume any work.
    pub fn new(calendar: &'a ResourceCalendar) -> ScheduleResult<Self> {
        if !calendar.work_minutes.has_capacity() {
            return Err(ScheduleError::NonTerminatingProjection(calendar.resource_id));
        }
        Ok(Self { calendar })
    }

    /// Walks forward from `start` one day at a time until `todo` minutes of
    /// weekday capacity have been consumed.
    ///
    /// A day without capacity adds a whole day. A day that is only partly
    /// needed adds the matching share of 24 hours.
    ///
    /// # Errors
    /// Returns `ScheduleError::ProjectionOutOfRange` when the end lies past
    /// the last representable instant.
    pub fn compute_raw_end(&self, start: Timestamp, todo: i64) -> ScheduleResult<Timestamp> {
        let out_of_range = || ScheduleError::ProjectionOutOfRange(self.calendar.resource_id);
        let mut todo = todo;
        let mut cursor = start;

        // Any seven consecutive days consume one weekly total in full days,
        // as long as more than that remains.
        let weekly = self.calendar.work_minutes.weekly_total();
        if todo > weekly {
            let weeks = (todo - 1) / weekly;
            cursor = advance_weeks(cursor, weeks).ok_or_else(out_of_range)?;
            todo -= weeks * weekly;
        }

        while todo > 0 {
            let available = self.calendar.work_minutes.for_instant(&cursor);
            let next = if available == 0 || todo >= available {
                next_day(cursor)
            } else {
                cursor.checked_add_signed(day_fraction(todo, available))
            };
            cursor = next.ok_or_else(out_of_range)?;
            todo -= available;
        }
        Ok(cursor)
    }

    /// Work minutes blocked by every unavailable period that begins inside
    /// `(start, end]`.
    ///
    /// Each matching period is walked day by day over its full length, so a
    /// period extending past `end` still counts completely, and overlapping
    /// periods are each counted.
    pub fn unavailable_minutes_in_window(&self, start: Timestamp, end: Timestamp) -> i64 {
        let mut minutes = 0;
        for period in &self.calendar.unavailable {
            if period.start <= start || period.start > end {
                continue;
            }
            let mut day = period.start;
            while day < period.end {
                minutes = self
                    .calendar
                    .work_minutes
                    .for_instant(&day)
                    .saturating_add(minutes);
                match next_day(day) {
                    Some(next) => day = next,
                    None => break,
                }
            }
        }
        minutes
    }

    /// Projects the end of a task starting at `start` with `remaining`
    /// minutes of work left.
    ///
    /// # Errors
    /// Returns `ScheduleError::ProjectionOutOfRange` when the work does not
    /// fit before the last representable instant.
    pub fn project(&self, start: Timestamp, remaining: i64) -> ScheduleResult<Projection> {
        if remaining <= 0 {
            return Ok(Projection::immediate(start));
        }

        let mut unavailable = 0;
        let mut iterations = 0;
        loop {
            let task_end = self.compute_raw_end(start, remaining.saturating_add(unavailable))?;
            iterations += 1;
            let blocked = self.unavailable_minutes_in_window(start, task_end);
            if blocked == unavailable {
                debug!(
                    "Resource {}: {} min from {} ends {} ({} min unavailable, {} iterations)",
                    self.calendar.resource_id, remaining, start, task_end, unavailable, iterations
                );
                return Ok(Projection {
                    task_end,
                    unavailable_minutes: unavailable,
                    iterations,
                });
            }
            unavailable = blocked;
        }
    }
}

/// Looks up the calendar of `resource_id` and projects a task on it.
///
/// No calendar is needed when nothing remains: the task ends where it
/// starts.
///
/// # Errors
/// * `ScheduleError::MissingCalendarData` if `calendars` has no entry for
///   the resource.
/// * `ScheduleError::NonTerminatingProjection` if the calendar has no
///   working minutes at all.
/// * `ScheduleError::ProjectionOutOfRange` if the end cannot be represented.
pub fn project<P>(
    calendars: &P,
    resource_id: ResourceId,
    start: Timestamp,
    remaining: i64,
) -> ScheduleResult<Projection>
where
    P: ResourceCalendarProvider + ?Sized,
{
    if remaining <= 0 {
        return Ok(Projection::immediate(start));
    }
    let calendar = calendars
        .calendar(resource_id)
        .ok_or(ScheduleError::MissingCalendarData(resource_id))?;
    EndDateProjector::new(calendar)?.project(start, remaining)
}
