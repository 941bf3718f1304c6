//! Bottom-up aggregation of the task forest.
//!
//! The engine works in two passes:
//!
//! 1. **Scheduling**: every bug is projected in previous-bug chain order, so
//!    a bug always starts where its predecessor for the same resource ends,
//!    whatever the position of both in the tree. This pass only reads the
//!    tree.
//! 2. **Rollup**: a post-order walk writes the bug windows and aggregates,
//!    then sums them into every ancestor. Children are always visited
//!    first; the per-node [`ComputeState`] makes a second call a no-op.
//!
//! Projection failures are local: the affected bug keeps its ledger totals,
//! gets an empty `[start, start)` window and a `Degraded` status, and its
//! chain successors start at that same instant.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::projection;
use crate::models::calendar::ResourceCalendarProvider;
use crate::models::macros::{BugId, ResourceId};
use crate::models::task::{
    Aggregates, BugData, ComputeState, NodeKind, ScheduleStatus, ScheduleWindow, TaskForest,
    TaskNode,
};
use crate::models::time::Timestamp;
use crate::models::work::{WorkCategorySet, WorkTotals};

/// A bug whose end date could not be projected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedBug {
    pub bug_id: BugId,
    pub handler_id: ResourceId,
    pub reason: String,
}

/// What one aggregation call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSummary {
    /// Bugs newly aggregated with a projected end date.
    pub projected: usize,
    /// Bugs newly aggregated without one.
    pub degraded: Vec<DegradedBug>,
}

impl AggregationSummary {
    fn merge(&mut self, other: AggregationSummary) {
        self.projected += other.projected;
        self.degraded.extend(other.degraded);
    }
}

/// Schedule of one bug, resolved before anything is written to the tree.
#[derive(Debug, Clone)]
struct BugSchedule {
    window: ScheduleWindow,
    unavailable_minutes: i64,
    status: ScheduleStatus,
}

/// Aggregates task trees against resource calendars.
pub struct AggregationEngine<'a, P: ResourceCalendarProvider + ?Sized> {
    calendars: &'a P,
    categories: &'a WorkCategorySet,
    reference_instant: Timestamp,
}

impl<'a, P: ResourceCalendarProvider + ?Sized> AggregationEngine<'a, P> {
    /// # Arguments
    /// * `calendars` - Calendar source, keyed by bug handler
    /// * `categories` - Configured work categories for ledger totals
    /// * `reference_instant` - Start of the first bug of every resource queue
    pub fn new(
        calendars: &'a P,
        categories: &'a WorkCategorySet,
        reference_instant: Timestamp,
    ) -> Self {
        Self {
            calendars,
            categories,
            reference_instant,
        }
    }

    /// Aggregates one subtree.
    ///
    /// Previous-bug links that point outside `node` are treated as absent.
    pub fn aggregate(&self, node: &mut TaskNode) -> AggregationSummary {
        let schedules = self.resolve_schedules(std::slice::from_ref(&*node));
        let mut summary = AggregationSummary::default();
        self.apply(node, &schedules, &mut HashSet::new(), &mut summary);
        summary
    }

    /// Aggregates every user of `forest`, chaining bugs across users,
    /// projects and categories.
    pub fn aggregate_forest(&self, forest: &mut TaskForest) -> AggregationSummary {
        let schedules = self.resolve_schedules(&forest.users);
        let mut summary = AggregationSummary::default();
        let mut placed = HashSet::new();
        for user in &mut forest.users {
            let mut local = AggregationSummary::default();
            self.apply(user, &schedules, &mut placed, &mut local);
            summary.merge(local);
        }
        info!(
            "Aggregated {} users: {} bugs projected, {} degraded",
            forest.users.len(),
            summary.projected,
            summary.degraded.len()
        );
        summary
    }

    /// Resolves the window of every bug below `roots` in chain order.
    fn resolve_schedules(&self, roots: &[TaskNode]) -> HashMap<BugId, BugSchedule> {
        let mut index: HashMap<BugId, &TaskNode> = HashMap::new();
        let mut order: Vec<BugId> = Vec::new();
        for node in roots.iter().flat_map(|root| root.bugs()) {
            if let Some(bug) = node.bug() {
                if index.contains_key(&bug.bug_id) {
                    warn!("Bug {} appears more than once; using its first node", bug.bug_id);
                    continue;
                }
                index.insert(bug.bug_id, node);
                order.push(bug.bug_id);
            }
        }

        let mut resolved: HashMap<BugId, BugSchedule> = HashMap::with_capacity(order.len());
        let mut visiting: HashSet<BugId> = HashSet::new();

        for bug_id in order {
            let mut stack = vec![bug_id];
            while let Some(&current) = stack.last() {
                if resolved.contains_key(&current) {
                    stack.pop();
                    continue;
                }
                let node = index[&current];
                let Some(bug) = node.bug() else {
                    stack.pop();
                    continue;
                };

                if node.is_computed() {
                    if let Some(window) = node.window {
                        resolved.insert(
                            current,
                            BugSchedule {
                                window,
                                unavailable_minutes: node.aggregates.na,
                                status: bug.status.clone(),
                            },
                        );
                        stack.pop();
                        continue;
                    }
                }

                let start = match self.predecessor(bug, &index) {
                    None => self.reference_instant,
                    Some(previous) => match resolved.get(&previous) {
                        Some(schedule) => schedule.window.end,
                        None if visiting.contains(&previous) => {
                            warn!(
                                "Previous-bug chain of bug {} loops back to bug {}; starting at reference instant",
                                current, previous
                            );
                            self.reference_instant
                        }
                        None => {
                            visiting.insert(current);
                            stack.push(previous);
                            continue;
                        }
                    },
                };

                resolved.insert(current, self.schedule_bug(bug, start));
                visiting.remove(&current);
                stack.pop();
            }
        }
        resolved
    }

    /// Chained predecessor of `bug`, if it is part of the aggregated trees
    /// and handled by the same resource.
    fn predecessor(&self, bug: &BugData, index: &HashMap<BugId, &TaskNode>) -> Option<BugId> {
        let previous = bug.previous_bug?;
        match index.get(&previous).and_then(|node| node.bug()) {
            Some(prev) if prev.handler_id == bug.handler_id => Some(previous),
            Some(_) => {
                debug!(
                    "Bug {}: previous bug {} has another handler; chain broken",
                    bug.bug_id, previous
                );
                None
            }
            None => {
                debug!(
                    "Bug {}: previous bug {} is not part of this tree",
                    bug.bug_id, previous
                );
                None
            }
        }
    }

    fn schedule_bug(&self, bug: &BugData, start: Timestamp) -> BugSchedule {
        let remaining = bug.ledger.totals(self.categories).remaining;
        match projection::project(self.calendars, bug.handler_id, start, remaining) {
            Ok(projection) => BugSchedule {
                window: ScheduleWindow::new(start, projection.task_end),
                unavailable_minutes: projection.unavailable_minutes,
                status: ScheduleStatus::Projected {
                    iterations: projection.iterations,
                },
            },
            Err(err) => {
                warn!("Bug {}: end date not projected: {}", bug.bug_id, err);
                BugSchedule {
                    window: ScheduleWindow::new(start, start),
                    unavailable_minutes: 0,
                    status: ScheduleStatus::Degraded {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    fn apply(
        &self,
        node: &mut TaskNode,
        schedules: &HashMap<BugId, BugSchedule>,
        placed: &mut HashSet<BugId>,
        summary: &mut AggregationSummary,
    ) {
        if node.state == ComputeState::Computing {
            warn!("Node {} re-entered during aggregation", node.name);
            return;
        }
        for child in &mut node.children {
            self.apply(child, schedules, placed, summary);
        }
        if node.is_computed() {
            return;
        }
        node.state = ComputeState::Computing;

        match &mut node.kind {
            NodeKind::Bug(bug) => {
                let totals = bug.ledger.totals(self.categories);
                let mut schedule = schedules.get(&bug.bug_id).cloned().unwrap_or_else(|| {
                    let start = self.reference_instant;
                    BugSchedule {
                        window: ScheduleWindow::new(start, start),
                        unavailable_minutes: 0,
                        status: ScheduleStatus::Pending,
                    }
                });

                if !placed.insert(bug.bug_id) {
                    // Another node of the same bug: shares its window, but
                    // the blocked minutes are only counted once.
                    schedule.unavailable_minutes = 0;
                } else if let ScheduleStatus::Degraded { reason } = &schedule.status {
                    summary.degraded.push(DegradedBug {
                        bug_id: bug.bug_id,
                        handler_id: bug.handler_id,
                        reason: reason.clone(),
                    });
                } else {
                    summary.projected += 1;
                }

                bug.status = schedule.status;
                node.window = Some(schedule.window);
                node.aggregates = Aggregates {
                    est: totals.estimate + schedule.unavailable_minutes,
                    done: totals.done,
                    na: schedule.unavailable_minutes,
                    overdue: totals.overdue,
                };
            }
            NodeKind::User { .. } | NodeKind::Project { .. } | NodeKind::Category { .. } => {
                let mut aggregates = Aggregates::default();
                let mut window: Option<ScheduleWindow> = None;
                for child in &node.children {
                    aggregates += child.aggregates;
                    if let Some(child_window) = child.window {
                        window = Some(match window {
                            Some(current) => current.union(&child_window),
                            None => child_window,
                        });
                    }
                }
                node.aggregates = aggregates;
                node.window = window;
            }
        }

        node.state = ComputeState::Computed;
    }
}

/// Drops every child of `node` when none of them has children of its own.
///
/// Returns `true` if children were removed. Pruning an aggregated node
/// leaves its aggregates stale, so it should run before aggregation.
pub fn remove_empty_children(node: &mut TaskNode) -> bool {
    if node.children.is_empty() || node.children.iter().any(|c| !c.children.is_empty()) {
        return false;
    }
    if node.is_computed() {
        warn!("Pruning children of already aggregated node {}", node.name);
    }
    node.children.clear();
    true
}

/// Applies [`remove_empty_children`] bottom-up to every user and project
/// node of `forest`. Returns the number of pruned nodes.
pub fn prune_empty_shells(forest: &mut TaskForest) -> usize {
    fn prune(node: &mut TaskNode) -> usize {
        let mut pruned: usize = node.children.iter_mut().map(prune).sum();
        if node.groups_internal_nodes() && remove_empty_children(node) {
            pruned += 1;
        }
        pruned
    }
    forest.users.iter_mut().map(prune).sum()
}

/// Ledger totals per handler over a subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRollup {
    totals: BTreeMap<ResourceId, WorkTotals>,
}

impl ResourceRollup {
    pub fn collect(node: &TaskNode, categories: &WorkCategorySet) -> Self {
        let mut rollup = Self::default();
        rollup.add_subtree(node, categories);
        rollup
    }

    pub fn collect_forest(forest: &TaskForest, categories: &WorkCategorySet) -> Self {
        let mut rollup = Self::default();
        for user in &forest.users {
            rollup.add_subtree(user, categories);
        }
        rollup
    }

    fn add_subtree(&mut self, node: &TaskNode, categories: &WorkCategorySet) {
        for bug in node.bugs().into_iter().filter_map(TaskNode::bug) {
            *self.totals.entry(bug.handler_id).or_default() += bug.ledger.totals(categories);
        }
    }

    pub fn get(&self, resource_id: ResourceId) -> Option<&WorkTotals> {
        self.totals.get(&resource_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceId, &WorkTotals)> {
        self.totals.iter()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Largest real estimate of any single handler, 0 when empty.
    pub fn max_real_estimate(&self) -> i64 {
        self.totals
            .values()
            .map(WorkTotals::real_estimate)
            .max()
            .unwrap_or(0)
    }
}

/// Largest per-handler real estimate inside `node`; used to normalize bar
/// widths.
pub fn max_real_estimate(node: &TaskNode, categories: &WorkCategorySet) -> i64 {
    ResourceRollup::collect(node, categories).max_real_estimate()
}

impl TaskForest {
    /// Largest per-handler real estimate of any single user root.
    pub fn max_real_estimate(&self, categories: &WorkCategorySet) -> i64 {
        self.users
            .iter()
            .map(|user| max_real_estimate(user, categories))
            .max()
            .unwrap_or(0)
    }
}
