//! Error types for scheduling and aggregation.
//!
//! Per-node failures (`MissingCalendarData`, `NonTerminatingProjection`,
//! `ProjectionOutOfRange`, `MalformedWorkRecord`) are reported through this
//! type but never abort a report: the aggregation engine and the forest
//! builder log them and degrade the affected node instead.

use crate::models::{BugId, ResourceId};

/// Result type for scheduling operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Error type for scheduling operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("No calendar configured for resource {0}")]
    MissingCalendarData(ResourceId),

    #[error("Resource {0} has no working minutes on any weekday; end date cannot be projected")]
    NonTerminatingProjection(ResourceId),

    #[error("Projected end for resource {0} lies beyond the supported date range")]
    ProjectionOutOfRange(ResourceId),

    #[error("Work record for bug {bug_id} references unknown work category '{category}'")]
    MalformedWorkRecord { bug_id: BugId, category: String },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ScheduleError {
    /// `true` for failures that only degrade a single node of the report.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ScheduleError::MissingCalendarData(_)
                | ScheduleError::NonTerminatingProjection(_)
                | ScheduleError::ProjectionOutOfRange(_)
                | ScheduleError::MalformedWorkRecord { .. }
        )
    }
}
