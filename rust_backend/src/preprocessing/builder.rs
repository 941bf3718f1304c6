//! Folds the flat record stream into a task forest.
//!
//! Nodes are created on first sight and kept in first-seen order. The
//! previous-bug relation is kept in a lookup table keyed by resource: a new
//! bug is linked to the last bug created for the same resource, which gives
//! every resource a FIFO queue in discovery order.

use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::error::ScheduleError;
use crate::models::macros::{BugId, CategoryId, ProjectId, ResourceId};
use crate::models::task::{TaskForest, TaskNode};
use crate::models::work::WorkCategorySet;
use crate::parsing::records::WorkRecord;

/// Forest plus the records that could not be applied.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub forest: TaskForest,
    /// One `MalformedWorkRecord` per skipped minute value.
    pub ignored: Vec<ScheduleError>,
}

/// Incremental tree builder.
pub struct ForestBuilder<'a> {
    categories: &'a WorkCategorySet,
    users: Vec<TaskNode>,
    user_index: HashMap<ResourceId, usize>,
    project_index: HashMap<(ResourceId, ProjectId), usize>,
    category_index: HashMap<(ResourceId, ProjectId, CategoryId), usize>,
    bug_index: HashMap<(ResourceId, ProjectId, CategoryId, BugId), usize>,
    last_bug: HashMap<ResourceId, BugId>,
    chained: HashSet<(ResourceId, BugId)>,
    ignored: Vec<ScheduleError>,
    records_seen: usize,
}

fn display_name(name: &str, fallback: impl std::fmt::Display) -> String {
    if name.trim().is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

impl<'a> ForestBuilder<'a> {
    pub fn new(categories: &'a WorkCategorySet) -> Self {
        Self {
            categories,
            users: Vec::new(),
            user_index: HashMap::new(),
            project_index: HashMap::new(),
            category_index: HashMap::new(),
            bug_index: HashMap::new(),
            last_bug: HashMap::new(),
            chained: HashSet::new(),
            ignored: Vec::new(),
            records_seen: 0,
        }
    }

    /// Applies one record: creates missing nodes along its path, then writes
    /// its minute value into the bug's ledger. A later record for the same
    /// bug, kind and category replaces the earlier value.
    pub fn push(&mut self, record: &WorkRecord) {
        self.records_seen += 1;

        let resource = record.resource_id;
        let project_key = (resource, record.project_id);
        let category_key = (resource, record.project_id, record.category_id);
        let bug_key = (resource, record.project_id, record.category_id, record.bug_id);

        let u = *self.user_index.entry(resource).or_insert_with(|| {
            self.users.push(TaskNode::new_user(resource));
            self.users.len() - 1
        });
        let user = &mut self.users[u];

        let p = *self.project_index.entry(project_key).or_insert_with(|| {
            let name = display_name(&record.project_name, record.project_id);
            user.children.push(TaskNode::new_project(record.project_id, name));
            user.children.len() - 1
        });
        let project = &mut user.children[p];

        let c = *self.category_index.entry(category_key).or_insert_with(|| {
            let name = display_name(&record.category_name, record.category_id);
            project.children.push(TaskNode::new_category(record.category_id, name));
            project.children.len() - 1
        });
        let category = &mut project.children[c];

        let last_bug = &mut self.last_bug;
        let chained = &mut self.chained;
        let b = *self.bug_index.entry(bug_key).or_insert_with(|| {
            // A bug seen again under another path keeps its place in the queue.
            let previous = if chained.insert((resource, record.bug_id)) {
                last_bug.insert(resource, record.bug_id)
            } else {
                None
            };
            category.children.push(TaskNode::new_bug(
                record.bug_id,
                record.bug_weight,
                record.bug_due_date,
                previous,
                resource,
            ));
            category.children.len() - 1
        });

        if !self.categories.contains(&record.work_category) {
            warn!(
                "Bug {}: ignoring {} minutes for unknown work category '{}'",
                record.bug_id, record.minute_value, record.work_category
            );
            self.ignored.push(ScheduleError::MalformedWorkRecord {
                bug_id: record.bug_id,
                category: record.work_category.clone(),
            });
            return;
        }

        if let Some(bug) = category.children[b].bug_mut() {
            bug.ledger
                .set(record.minutes_kind, record.work_category.as_str(), record.minute_value);
        }
    }

    pub fn extend<'r, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'r WorkRecord>,
    {
        for record in records {
            self.push(record);
        }
    }

    pub fn finish(self) -> BuildOutcome {
        info!(
            "Built task forest: {} users, {} bugs from {} records ({} ignored)",
            self.users.len(),
            self.bug_index.len(),
            self.records_seen,
            self.ignored.len()
        );
        BuildOutcome {
            forest: TaskForest::new(self.users),
            ignored: self.ignored,
        }
    }
}

/// Builds a forest from a complete record list.
pub fn build_forest(records: &[WorkRecord], categories: &WorkCategorySet) -> BuildOutcome {
    let mut builder = ForestBuilder::new(categories);
    builder.extend(records);
    builder.finish()
}
