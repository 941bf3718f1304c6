//! # PM Progress
//!
//! Projected completion dates and rolled-up progress metrics for a hierarchy
//! of work items: users → projects → categories → bugs.
//!
//! Every bug is assigned to one resource whose work capacity follows a
//! weekly pattern with unavailable periods. The crate projects when each bug
//! will be finished, queuing the bugs of a resource one after the other, and
//! sums estimated, done, unavailable and overdue minutes bottom-up through
//! the tree.
//!
//! ## Architecture
//!
//! - [`models`]: Calendars, work ledgers, and the task tree
//! - [`algorithms`]: End date projection, aggregation, and progress metrics
//! - [`parsing`]: JSON decoding of the flat work record stream
//! - [`preprocessing`]: Forest building and input validation
//! - [`config`]: TOML configuration of work categories and calendars
//! - [`services`]: One-shot report pipeline
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger;
//! the embedding application chooses one.
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use pm_progress::config::ProgressConfig;
//! use pm_progress::parsing::parse_records_str;
//! use pm_progress::services::build_report;
//!
//! let config: ProgressConfig = r#"
//! [work]
//! categories = ["coding"]
//!
//! [[resources]]
//! id = 1
//! work_minutes = { monday = 480, tuesday = 480, wednesday = 480, thursday = 480, friday = 480 }
//! "#
//! .parse()
//! .unwrap();
//!
//! let records = parse_records_str(
//!     r#"[{"resource_id": 1, "project_id": 1, "category_id": 1, "bug_id": 1,
//!          "work_category": "coding", "minutes_kind": "estimate", "minute_value": 960}]"#,
//! )
//! .unwrap();
//!
//! let monday = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
//! let report = build_report(&records, &config, monday).unwrap();
//! assert_eq!(report.reference_max, 960);
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod parsing;
pub mod preprocessing;
pub mod services;

pub use config::ProgressConfig;
pub use error::{ScheduleError, ScheduleResult};
