//! Input validation with detailed error and warning reporting.
//!
//! Checks the record stream and the calendars it needs before a report is
//! built. Nothing found here stops a report: aggregation degrades the
//! affected nodes on its own. The result tells callers up front what will be
//! degraded or ignored and why.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::calendar::ResourceCalendarProvider;
use crate::models::macros::{BugId, CategoryId, ProjectId, ResourceId};
use crate::models::work::{MinutesKind, WorkCategorySet};
use crate::parsing::records::WorkRecord;

/// Number of individual messages reported per issue kind before summarizing.
const MAX_REPORTED: usize = 5;

/// Validation result with categorized issues and statistics.
///
/// Errors make `is_valid` false, while warnings are informational.
///
/// # Examples
///
/// ```
/// use pm_progress::preprocessing::validator::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("Negative minute value".to_string());
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
///
/// # Fields
///
/// * `total_records` - Number of records checked
/// * `resources` - Distinct resources referenced
/// * `bugs` - Distinct bugs referenced
/// * `negative_values` - Records with a negative minute value
/// * `unknown_categories` - Records naming a category outside the configured set
/// * `overwritten_values` - Records replacing an earlier value for the same bug, kind and category
/// * `relocated_bugs` - Bugs that appear under more than one user/project/category path
/// * `resources_without_calendar` - Resources with no calendar entry
/// * `empty_calendars` - Resources whose calendar has no working minutes
/// * `overlapping_periods` - Pairs of overlapping unavailable periods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_records: usize,
    pub resources: usize,
    pub bugs: usize,
    pub negative_values: usize,
    pub unknown_categories: usize,
    pub overwritten_values: usize,
    pub relocated_bugs: usize,
    pub resources_without_calendar: usize,
    pub empty_calendars: usize,
    pub overlapping_periods: usize,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    /// Adds a critical error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Adds a non-critical warning without invalidating the result.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates records against the configured categories and calendars.
///
/// Performs:
/// - Negative minute value detection (errors)
/// - Unknown work category detection
/// - Detection of rows that overwrite an earlier value
/// - Detection of bugs appearing under several paths
/// - Calendar checks for every referenced resource: missing, without any
///   working minutes, overlapping unavailable periods
///
/// # Arguments
///
/// * `records` - Flat record stream
/// * `categories` - Configured work categories
/// * `calendars` - Calendar source used for aggregation
///
/// # Returns
///
/// `ValidationResult` containing all errors, warnings, and statistics.
pub fn validate_inputs<P>(
    records: &[WorkRecord],
    categories: &WorkCategorySet,
    calendars: &P,
) -> ValidationResult
where
    P: ResourceCalendarProvider + ?Sized,
{
    let mut result = ValidationResult::new();
    result.stats.total_records = records.len();

    let mut resources: BTreeSet<ResourceId> = BTreeSet::new();
    let mut paths: HashMap<BugId, (ResourceId, ProjectId, CategoryId)> = HashMap::new();
    let mut relocated: HashSet<BugId> = HashSet::new();
    let mut values: HashSet<(BugId, MinutesKind, &str)> = HashSet::new();

    for (idx, record) in records.iter().enumerate() {
        resources.insert(record.resource_id);

        if record.minute_value < 0 {
            result.stats.negative_values += 1;
            if result.stats.negative_values <= MAX_REPORTED {
                result.add_error(format!(
                    "Record {} (bug {}): negative minute value {}",
                    idx, record.bug_id, record.minute_value
                ));
            }
        }

        if !categories.contains(&record.work_category) {
            result.stats.unknown_categories += 1;
            if result.stats.unknown_categories <= MAX_REPORTED {
                result.add_warning(format!(
                    "Record {} (bug {}): unknown work category '{}' will be ignored",
                    idx, record.bug_id, record.work_category
                ));
            }
        }

        if !values.insert((record.bug_id, record.minutes_kind, record.work_category.as_str())) {
            result.stats.overwritten_values += 1;
        }

        let path = (record.resource_id, record.project_id, record.category_id);
        match paths.get(&record.bug_id) {
            Some(first) if *first != path => {
                if relocated.insert(record.bug_id) {
                    result.add_warning(format!(
                        "Bug {} appears under more than one resource/project/category",
                        record.bug_id
                    ));
                }
            }
            Some(_) => {}
            None => {
                paths.insert(record.bug_id, path);
            }
        }
    }

    if result.stats.negative_values > MAX_REPORTED {
        result.add_error(format!(
            "Total negative minute values: {} (showing first {})",
            result.stats.negative_values, MAX_REPORTED
        ));
    }
    if result.stats.unknown_categories > MAX_REPORTED {
        result.add_warning(format!(
            "Total records with unknown work categories: {} (showing first {})",
            result.stats.unknown_categories, MAX_REPORTED
        ));
    }
    if result.stats.overwritten_values > 0 {
        result.add_warning(format!(
            "{} records overwrite an earlier value for the same bug, kind and category",
            result.stats.overwritten_values
        ));
    }

    result.stats.resources = resources.len();
    result.stats.bugs = paths.len();
    result.stats.relocated_bugs = relocated.len();

    for resource in resources {
        let Some(calendar) = calendars.calendar(resource) else {
            result.stats.resources_without_calendar += 1;
            result.add_warning(format!(
                "Resource {} has no calendar; its bugs will not be projected",
                resource
            ));
            continue;
        };

        if !calendar.work_minutes.has_capacity() {
            result.stats.empty_calendars += 1;
            result.add_warning(format!(
                "Resource {} has no working minutes on any weekday; its bugs will not be projected",
                resource
            ));
        }

        let overlaps = calendar.overlapping_periods();
        if !overlaps.is_empty() {
            result.stats.overlapping_periods += overlaps.len();
            result.add_warning(format!(
                "Resource {} has {} overlapping unavailable period pair(s); blocked minutes are counted once per period",
                resource,
                overlaps.len()
            ));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calendar::{
        CalendarRegistry, ResourceCalendar, UnavailablePeriod, WeekdayMinutes,
    };
    use chrono::{TimeZone, Utc};

    fn record(resource: i64, category: i64, bug: i64, work: &str, minutes: i64) -> WorkRecord {
        WorkRecord {
            resource_id: ResourceId(resource),
            project_id: ProjectId(1),
            project_name: "P".to_string(),
            category_id: CategoryId(category),
            category_name: "C".to_string(),
            bug_id: BugId(bug),
            bug_weight: 0,
            bug_due_date: None,
            work_category: work.to_string(),
            minutes_kind: MinutesKind::Estimate,
            minute_value: minutes,
        }
    }

    fn registry() -> CalendarRegistry {
        let day = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 0, 0, 0).unwrap();
        vec![
            ResourceCalendar::new(ResourceId(1), WeekdayMinutes::weekdays(480)),
            ResourceCalendar::new(ResourceId(2), WeekdayMinutes::new([0; 7])),
            ResourceCalendar::new(ResourceId(3), WeekdayMinutes::weekdays(480))
                .with_unavailable(UnavailablePeriod::new(day(2), day(5)).unwrap())
                .with_unavailable(UnavailablePeriod::new(day(4), day(6)).unwrap()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_clean_input_is_valid() {
        let categories = WorkCategorySet::new(["coding"]);
        let records = vec![record(1, 1, 1, "coding", 60), record(1, 1, 2, "coding", 30)];

        let result = validate_inputs(&records, &categories, &registry());
        assert!(result.is_valid);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.stats.total_records, 2);
        assert_eq!(result.stats.resources, 1);
        assert_eq!(result.stats.bugs, 2);
    }

    #[test]
    fn test_negative_values_are_errors() {
        let categories = WorkCategorySet::new(["coding"]);
        let records: Vec<WorkRecord> = (0..7).map(|i| record(1, 1, i, "coding", -1)).collect();

        let result = validate_inputs(&records, &categories, &registry());
        assert!(!result.is_valid);
        assert_eq!(result.stats.negative_values, 7);
        // Five individual messages plus a summary.
        assert_eq!(result.errors.len(), MAX_REPORTED + 1);
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let categories = WorkCategorySet::new(["coding"]);
        let records = vec![
            record(1, 1, 1, "painting", 60),
            record(1, 1, 1, "coding", 60),
            record(1, 1, 1, "coding", 90),
            record(1, 2, 1, "coding", 10),
            record(2, 1, 5, "coding", 10),
            record(3, 1, 6, "coding", 10),
            record(4, 1, 7, "coding", 10),
        ];

        let result = validate_inputs(&records, &categories, &registry());
        assert!(result.is_valid);
        assert_eq!(result.stats.unknown_categories, 1);
        assert_eq!(result.stats.overwritten_values, 2);
        assert_eq!(result.stats.relocated_bugs, 1);
        assert_eq!(result.stats.empty_calendars, 1);
        assert_eq!(result.stats.overlapping_periods, 1);
        assert_eq!(result.stats.resources_without_calendar, 1);
        assert_eq!(result.stats.resources, 4);
        assert!(result.warnings.iter().any(|w| w.contains("Resource 4 has no calendar")));
    }
}
