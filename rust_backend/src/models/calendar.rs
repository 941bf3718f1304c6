//! Resource work calendars.
//!
//! A [`ResourceCalendar`] describes how many minutes a resource can work on
//! each weekday and when it is unavailable (vacations, leave). Calendars are
//! read-only inputs to scheduling and are looked up through the
//! [`ResourceCalendarProvider`] trait, so tests can inject synthetic
//! calendars without any process-wide configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::macros::ResourceId;
use super::time::{iso_weekday, Timestamp};
use crate::error::{ScheduleError, ScheduleResult};

/// Available work minutes per ISO weekday (index 0 = Monday ... 6 = Sunday).
///
/// Negative inputs are clamped to zero on construction. A zero entry means
/// the resource never works on that weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekdayMinutes([i64; 7]);

impl WeekdayMinutes {
    /// Creates a weekly pattern from Monday-first minute values.
    pub fn new(minutes: [i64; 7]) -> Self {
        Self(minutes.map(|m| m.max(0)))
    }

    /// Same number of minutes Monday to Friday, weekend off.
    pub fn weekdays(minutes: i64) -> Self {
        Self::new([minutes, minutes, minutes, minutes, minutes, 0, 0])
    }

    /// Minutes available on ISO weekday `iso_day` (1 = Monday ... 7 = Sunday).
    /// Out-of-range days have no capacity.
    pub fn for_iso_day(&self, iso_day: u8) -> i64 {
        match iso_day {
            1..=7 => self.0[usize::from(iso_day - 1)],
            _ => 0,
        }
    }

    /// Minutes available on the weekday of `ts`.
    pub fn for_instant(&self, ts: &Timestamp) -> i64 {
        self.for_iso_day(iso_weekday(ts))
    }

    /// `true` if at least one weekday has positive capacity.
    pub fn has_capacity(&self) -> bool {
        self.0.iter().any(|&m| m > 0)
    }

    /// Sum over the week, saturating at `i64::MAX`.
    pub fn weekly_total(&self) -> i64 {
        self.0.iter().fold(0, |total: i64, &m| total.saturating_add(m))
    }
}

/// Half-open interval `[start, end)` during which a resource does not work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailablePeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl UnavailablePeriod {
    /// Creates a period, rejecting empty or inverted intervals.
    ///
    /// # Errors
    /// Returns `ScheduleError::ConfigurationError` when `start >= end`.
    pub fn new(start: Timestamp, end: Timestamp) -> ScheduleResult<Self> {
        if start >= end {
            return Err(ScheduleError::ConfigurationError(format!(
                "unavailable period must start before it ends ({start} >= {end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn overlaps(&self, other: &UnavailablePeriod) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Work capacity description of one resource.
///
/// Unavailable periods are kept exactly as given: unsorted input is fine and
/// overlapping periods are not merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCalendar {
    pub resource_id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub work_minutes: WeekdayMinutes,
    #[serde(default)]
    pub unavailable: Vec<UnavailablePeriod>,
}

impl ResourceCalendar {
    pub fn new(resource_id: ResourceId, work_minutes: WeekdayMinutes) -> Self {
        Self {
            resource_id,
            name: None,
            work_minutes,
            unavailable: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_unavailable(mut self, period: UnavailablePeriod) -> Self {
        self.unavailable.push(period);
        self
    }

    /// Pairs of unavailable periods (by index) that overlap each other.
    ///
    /// Overlapping periods are each counted in full by the projector, so
    /// callers may want to surface them.
    pub fn overlapping_periods(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.unavailable.iter().enumerate() {
            for (j, b) in self.unavailable.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

/// Source of resource calendars, keyed by resource id.
pub trait ResourceCalendarProvider {
    /// Returns the calendar of `resource_id`, or `None` when no calendar is
    /// configured for it.
    fn calendar(&self, resource_id: ResourceId) -> Option<&ResourceCalendar>;
}

/// In-memory calendar store.
#[derive(Debug, Clone, Default)]
pub struct CalendarRegistry {
    calendars: HashMap<ResourceId, ResourceCalendar>,
}

impl CalendarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the calendar of `calendar.resource_id`, returning the
    /// replaced one.
    pub fn insert(&mut self, calendar: ResourceCalendar) -> Option<ResourceCalendar> {
        self.calendars.insert(calendar.resource_id, calendar)
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceCalendar> {
        self.calendars.values()
    }
}

impl FromIterator<ResourceCalendar> for CalendarRegistry {
    fn from_iter<I: IntoIterator<Item = ResourceCalendar>>(iter: I) -> Self {
        let mut registry = Self::new();
        for calendar in iter {
            registry.insert(calendar);
        }
        registry
    }
}

impl ResourceCalendarProvider for CalendarRegistry {
    fn calendar(&self, resource_id: ResourceId) -> Option<&ResourceCalendar> {
        self.calendars.get(&resource_id)
    }
}
