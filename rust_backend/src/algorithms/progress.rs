//! Display percentages derived from aggregated minutes.
//!
//! All functions are pure. Fractions of a node are always taken against the
//! node's own estimate; only [`percent_of_reference`] relates a node to the
//! rest of the report.

use serde::{Deserialize, Serialize};

use crate::models::task::{Aggregates, ScheduleWindow};
use crate::models::work::WorkTotals;

fn percent(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 * 100.0 / whole as f64
    } else {
        0.0
    }
}

/// Width of a node's bar relative to the largest estimate of the report.
pub fn percent_of_reference(est: i64, reference_max: i64) -> f64 {
    percent(est, reference_max)
}

/// Share of the estimate done within the original budget.
pub fn original_work_fraction(est: i64, done: i64, overdue: i64) -> f64 {
    percent(done - overdue, est)
}

/// Share of the estimate done overall.
pub fn total_work_fraction(est: i64, done: i64) -> f64 {
    percent(done, est)
}

/// Share of the estimate spent beyond the original budget.
pub fn overdue_fraction(est: i64, overdue: i64) -> f64 {
    percent(overdue, est)
}

/// Bar geometry of one node, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressBar {
    /// Bar length against the report's reference max.
    pub total_width: f64,
    pub original_work: f64,
    pub total_work: f64,
    pub extra_work: f64,
}

impl ProgressBar {
    pub fn new(est: i64, done: i64, overdue: i64, reference_max: i64) -> Self {
        Self {
            total_width: percent_of_reference(est, reference_max),
            original_work: original_work_fraction(est, done, overdue),
            total_work: total_work_fraction(est, done),
            extra_work: overdue_fraction(est, overdue),
        }
    }

    /// Bar of an aggregated node. Unavailable minutes are not work, so the
    /// real estimate is used.
    pub fn from_aggregates(aggregates: &Aggregates, reference_max: i64) -> Self {
        Self::new(
            aggregates.real_estimate(),
            aggregates.done,
            aggregates.overdue,
            reference_max,
        )
    }

    /// Bar of a per-resource rollup entry.
    pub fn from_totals(totals: &WorkTotals, reference_max: i64) -> Self {
        Self::new(totals.estimate, totals.done, totals.overdue, reference_max)
    }

    pub fn has_extra_work(&self) -> bool {
        self.extra_work > 0.0
    }
}

/// Horizontal placement of a window inside a chart range, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineSpan {
    pub left: f64,
    pub width: f64,
}

/// Places `window` on a chart covering `range`.
///
/// Returns `None` for an empty range, where nothing can be drawn.
pub fn timeline_span(window: &ScheduleWindow, range: &ScheduleWindow) -> Option<TimelineSpan> {
    let span = (range.end - range.start).num_milliseconds();
    if span <= 0 {
        return None;
    }
    let offset = (window.start - range.start).num_milliseconds();
    let length = (window.end - window.start).num_milliseconds();
    Some(TimelineSpan {
        left: offset as f64 * 100.0 / span as f64,
        width: length as f64 * 100.0 / span as f64,
    })
}
