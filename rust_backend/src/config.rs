//! Progress report configuration file support.
//!
//! This module reads the configured work categories and the resource
//! calendars from a TOML file:
//!
//! ```toml
//! [work]
//! categories = ["design", "coding", "testing"]
//!
//! [[resources]]
//! id = 7
//! name = "alice"
//! [resources.work_minutes]
//! monday = 480
//! tuesday = 480
//! [[resources.unavailable]]
//! start = "2026-03-02T00:00:00Z"
//! end = "2026-03-07T00:00:00Z"
//! ```
//!
//! Capacity may be given as `work_hours` instead of `work_minutes`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::calendar::{CalendarRegistry, ResourceCalendar, UnavailablePeriod, WeekdayMinutes};
use crate::models::macros::ResourceId;
use crate::models::time::{parse_timestamp, MINUTES_PER_DAY, MINUTES_PER_HOUR};
use crate::models::work::WorkCategorySet;

/// Report configuration from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    pub work: WorkSettings,
    #[serde(default)]
    pub resources: Vec<ResourceSettings>,
}

/// Work category settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSettings {
    pub categories: Vec<String>,
}

/// Calendar settings of one resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSettings {
    pub id: ResourceId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub work_minutes: Option<WeekdaySettings>,
    #[serde(default)]
    pub work_hours: Option<WeekdaySettings>,
    #[serde(default)]
    pub unavailable: Vec<PeriodSettings>,
}

/// Capacity per weekday; missing days are 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeekdaySettings {
    #[serde(default)]
    pub monday: f64,
    #[serde(default)]
    pub tuesday: f64,
    #[serde(default)]
    pub wednesday: f64,
    #[serde(default)]
    pub thursday: f64,
    #[serde(default)]
    pub friday: f64,
    #[serde(default)]
    pub saturday: f64,
    #[serde(default)]
    pub sunday: f64,
}

impl WeekdaySettings {
    fn values(&self) -> [f64; 7] {
        [
            self.monday,
            self.tuesday,
            self.wednesday,
            self.thursday,
            self.friday,
            self.saturday,
            self.sunday,
        ]
    }

    /// Whole minutes per weekday, each value multiplied by `scale` first.
    fn to_minutes(&self, scale: f64) -> WeekdayMinutes {
        WeekdayMinutes::new(self.values().map(|v| (v * scale).round() as i64))
    }
}

/// Unavailable period as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSettings {
    pub start: String,
    pub end: String,
}

impl ResourceSettings {
    fn weekday_minutes(&self) -> ScheduleResult<WeekdayMinutes> {
        let (settings, scale) = match (&self.work_minutes, &self.work_hours) {
            (Some(minutes), None) => (minutes, 1.0),
            (None, Some(hours)) => (hours, MINUTES_PER_HOUR as f64),
            (Some(_), Some(_)) => {
                return Err(ScheduleError::ConfigurationError(format!(
                    "Resource {} sets both 'work_minutes' and 'work_hours'",
                    self.id
                )))
            }
            (None, None) => {
                return Err(ScheduleError::ConfigurationError(format!(
                    "Resource {} requires 'work_minutes' or 'work_hours'",
                    self.id
                )))
            }
        };
        if settings.values().iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ScheduleError::ConfigurationError(format!(
                "Resource {} has a negative or invalid weekday capacity",
                self.id
            )));
        }
        if settings.values().iter().any(|v| v * scale > MINUTES_PER_DAY as f64) {
            return Err(ScheduleError::ConfigurationError(format!(
                "Resource {} has a weekday capacity above {} minutes",
                self.id, MINUTES_PER_DAY
            )));
        }
        Ok(settings.to_minutes(scale))
    }

    /// Builds the calendar described by these settings.
    pub fn to_calendar(&self) -> ScheduleResult<ResourceCalendar> {
        let mut calendar = ResourceCalendar::new(self.id, self.weekday_minutes()?);
        if let Some(name) = &self.name {
            calendar = calendar.with_name(name.clone());
        }
        for period in &self.unavailable {
            let start = parse_timestamp(&period.start)?;
            let end = parse_timestamp(&period.end)?;
            let period = UnavailablePeriod::new(start, end).map_err(|e| {
                ScheduleError::ConfigurationError(format!("Resource {}: {}", self.id, e))
            })?;
            calendar = calendar.with_unavailable(period);
        }
        Ok(calendar)
    }
}

impl FromStr for ProgressConfig {
    type Err = ScheduleError;

    /// Parses and validates a TOML document.
    fn from_str(content: &str) -> ScheduleResult<Self> {
        let config: ProgressConfig = toml::from_str(content).map_err(|e| {
            ScheduleError::ConfigurationError(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl ProgressConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ProgressConfig)` if successful
    /// * `Err(ScheduleError)` if the file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScheduleResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ScheduleError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        content.parse()
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `progress.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> ScheduleResult<Self> {
        let search_paths = [
            PathBuf::from("progress.toml"),
            PathBuf::from("rust_backend/progress.toml"),
            PathBuf::from("../progress.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ScheduleError::ConfigurationError(
            "No progress.toml found in standard locations".to_string(),
        ))
    }

    /// Checks everything that can be checked without building calendars,
    /// then builds them once to surface period errors.
    pub fn validate(&self) -> ScheduleResult<()> {
        if self.work_categories().is_empty() {
            return Err(ScheduleError::ConfigurationError(
                "'work.categories' must list at least one category".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.id) {
                return Err(ScheduleError::ConfigurationError(format!(
                    "Resource {} is configured more than once",
                    resource.id
                )));
            }
            resource.to_calendar()?;
        }
        Ok(())
    }

    pub fn work_categories(&self) -> WorkCategorySet {
        WorkCategorySet::new(self.work.categories.iter().cloned())
    }

    pub fn calendars(&self) -> ScheduleResult<CalendarRegistry> {
        self.resources.iter().map(ResourceSettings::to_calendar).collect()
    }
}
