use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::algorithms::aggregation::{
    prune_empty_shells, AggregationEngine, DegradedBug, ResourceRollup,
};
use crate::algorithms::progress::{timeline_span, ProgressBar, TimelineSpan};
use crate::config::ProgressConfig;
use crate::error::ScheduleResult;
use crate::models::calendar::ResourceCalendarProvider;
use crate::models::macros::ResourceId;
use crate::models::task::{ScheduleWindow, TaskForest, TaskNode};
use crate::models::time::Timestamp;
use crate::models::work::{WorkCategorySet, WorkTotals};
use crate::parsing::records::{parse_records_file, WorkRecord};
use crate::preprocessing::builder::build_forest;

/// Per-resource totals with their bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProgress {
    pub resource_id: ResourceId,
    pub name: Option<String>,
    pub totals: WorkTotals,
    pub bar: ProgressBar,
}

/// Everything the renderer needs for one report request.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub reference_instant: Timestamp,
    pub forest: TaskForest,
    /// Largest per-resource real estimate; normalizes bar widths.
    pub reference_max: i64,
    pub resources: Vec<ResourceProgress>,
    /// Window covering every user, `None` when nothing was scheduled.
    pub timeline: Option<ScheduleWindow>,
    pub degraded_bugs: Vec<DegradedBug>,
    pub ignored_records: Vec<String>,
    pub pruned_nodes: usize,
}

impl ProgressReport {
    /// Bar of any node of this report.
    pub fn bar(&self, node: &TaskNode) -> ProgressBar {
        ProgressBar::from_aggregates(&node.aggregates, self.reference_max)
    }

    /// Placement of a node on the report timeline. `None` for nodes without
    /// a window and for an empty timeline.
    pub fn span(&self, node: &TaskNode) -> Option<TimelineSpan> {
        timeline_span(node.window.as_ref()?, self.timeline.as_ref()?)
    }
}

/// Compute a progress report from already loaded records.
///
/// Runs builder → pruning → aggregation → rollups. Never fails: problems
/// with single bugs end up in `degraded_bugs` and `ignored_records`.
pub fn compute_report<P>(
    records: &[WorkRecord],
    categories: &WorkCategorySet,
    calendars: &P,
    reference_instant: Timestamp,
) -> ProgressReport
where
    P: ResourceCalendarProvider + ?Sized,
{
    let outcome = build_forest(records, categories);
    let mut forest = outcome.forest;

    let pruned_nodes = prune_empty_shells(&mut forest);

    let engine = AggregationEngine::new(calendars, categories, reference_instant);
    let summary = engine.aggregate_forest(&mut forest);

    let reference_max = forest.max_real_estimate(categories);

    let resources: Vec<ResourceProgress> = ResourceRollup::collect_forest(&forest, categories)
        .iter()
        .map(|(resource_id, totals)| ResourceProgress {
            resource_id: *resource_id,
            name: calendars
                .calendar(*resource_id)
                .and_then(|calendar| calendar.name.clone()),
            totals: *totals,
            bar: ProgressBar::from_totals(totals, reference_max),
        })
        .collect();

    let timeline = forest
        .users
        .iter()
        .filter_map(|user| user.window)
        .reduce(|a, b| a.union(&b));

    info!(
        "Report for {} records: {} users, {} resources, reference max {} min",
        records.len(),
        forest.users.len(),
        resources.len(),
        reference_max
    );

    ProgressReport {
        reference_instant,
        forest,
        reference_max,
        resources,
        timeline,
        degraded_bugs: summary.degraded,
        ignored_records: outcome.ignored.iter().map(ToString::to_string).collect(),
        pruned_nodes,
    }
}

/// Compute a progress report with the categories and calendars of `config`.
pub fn build_report(
    records: &[WorkRecord],
    config: &ProgressConfig,
    reference_instant: Timestamp,
) -> ScheduleResult<ProgressReport> {
    let calendars = config.calendars()?;
    let categories = config.work_categories();
    Ok(compute_report(records, &categories, &calendars, reference_instant))
}

/// Load work records from a JSON file.
pub fn load_records_file(path: &Path) -> Result<Vec<WorkRecord>> {
    let records = parse_records_file(path)?;
    info!("Loaded {} work records from {}", records.len(), path.display());
    Ok(records)
}

/// Load configuration and records from disk and compute the report.
pub fn build_report_from_files(
    config_path: &Path,
    records_path: &Path,
    reference_instant: Timestamp,
) -> Result<ProgressReport> {
    let config = ProgressConfig::from_file(config_path)
        .with_context(|| format!("Failed to load configuration: {}", config_path.display()))?;
    let records = load_records_file(records_path)?;
    build_report(&records, &config, reference_instant).context("Failed to build progress report")
}
