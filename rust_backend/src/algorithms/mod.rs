//! Scheduling and aggregation algorithms.
//!
//! # Components
//!
//! - [`projection`]: End date projection against a resource calendar
//! - [`aggregation`]: Bottom-up rollup of the task forest, pruning and
//!   per-resource totals
//! - [`progress`]: Display percentages for progress bars and timelines
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use pm_progress::algorithms::EndDateProjector;
//! use pm_progress::models::{ResourceCalendar, ResourceId, WeekdayMinutes};
//!
//! let calendar = ResourceCalendar::new(ResourceId(1), WeekdayMinutes::weekdays(480));
//! let projector = EndDateProjector::new(&calendar).unwrap();
//!
//! let monday = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
//! let projection = projector.project(monday, 960).unwrap();
//! assert_eq!(projection.task_end, Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap());
//! ```

pub mod aggregation;
pub mod progress;
pub mod projection;

#[cfg(test)]
mod aggregation_tests;

pub use aggregation::{
    max_real_estimate, prune_empty_shells, remove_empty_children, AggregationEngine,
    AggregationSummary, DegradedBug, ResourceRollup,
};
pub use progress::{
    original_work_fraction, overdue_fraction, percent_of_reference, timeline_span,
    total_work_fraction, ProgressBar, TimelineSpan,
};
pub use projection::{project, EndDateProjector, Projection};
