//! Task hierarchy: users → projects → categories → bugs.
//!
//! Every level is a [`TaskNode`]; the level-specific data lives in the
//! [`NodeKind`] tag. Only bug nodes own a [`WorkLedger`]; every other node's
//! aggregates are the sum of its children's.
//!
//! # Lifecycle
//! Nodes are created once while the forest is assembled, aggregated exactly
//! once (`ComputeState` goes `Uncomputed → Computing → Computed` and never
//! back), and are read-only afterwards.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::macros::{BugId, CategoryId, ProjectId, ResourceId};
use super::time::Timestamp;
use super::work::{WorkCategorySet, WorkLedger, WorkTotals};

/// Aggregation progress of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeState {
    #[default]
    Uncomputed,
    Computing,
    Computed,
}

/// Resolved schedule window `[start, end)` of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl ScheduleWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// `true` if `other` lies fully inside this window.
    pub fn contains(&self, other: &ScheduleWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest window covering both.
    pub fn union(&self, other: &ScheduleWindow) -> ScheduleWindow {
        ScheduleWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// Minute aggregates of a node.
///
/// For a bug `est` already includes the unavailable minutes `na`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub est: i64,
    pub done: i64,
    pub na: i64,
    pub overdue: i64,
}

impl Aggregates {
    /// Estimate without the unavailability inflation.
    pub fn real_estimate(&self) -> i64 {
        if self.na > 0 {
            self.est - self.na
        } else {
            self.est
        }
    }
}

impl AddAssign for Aggregates {
    fn add_assign(&mut self, rhs: Self) {
        self.est += rhs.est;
        self.done += rhs.done;
        self.na += rhs.na;
        self.overdue += rhs.overdue;
    }
}

/// Outcome of projecting a bug's end date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Not aggregated yet.
    Pending,
    /// End date projected against the resource calendar.
    Projected { iterations: u32 },
    /// Projection impossible; the window collapses to `[start, start)`.
    Degraded { reason: String },
}

/// Bug-specific node data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BugData {
    pub bug_id: BugId,
    pub handler_id: ResourceId,
    /// Relative weight among sibling bugs of the same resource.
    pub weight: i64,
    pub due_date: Option<Timestamp>,
    /// Bug scheduled right before this one for the same resource. A lookup
    /// key, not an ownership edge; it may point outside the aggregated tree.
    pub previous_bug: Option<BugId>,
    pub ledger: WorkLedger,
    pub status: ScheduleStatus,
}

/// Level of a node in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    User { resource_id: ResourceId },
    Project { project_id: ProjectId },
    Category { category_id: CategoryId },
    Bug(Box<BugData>),
}

impl NodeKind {
    /// Single-letter type code (U, P, C, B).
    pub fn code(&self) -> char {
        match self {
            NodeKind::User { .. } => 'U',
            NodeKind::Project { .. } => 'P',
            NodeKind::Category { .. } => 'C',
            NodeKind::Bug(_) => 'B',
        }
    }
}

/// One node of the task forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskNode {
    pub kind: NodeKind,
    pub name: String,
    /// Children in first-seen order.
    pub children: Vec<TaskNode>,
    /// `None` until aggregated, and for internal nodes without bugs below.
    pub window: Option<ScheduleWindow>,
    pub aggregates: Aggregates,
    #[serde(skip)]
    pub(crate) state: ComputeState,
}

impl TaskNode {
    fn with_kind(kind: NodeKind, name: String) -> Self {
        Self {
            kind,
            name,
            children: Vec::new(),
            window: None,
            aggregates: Aggregates::default(),
            state: ComputeState::Uncomputed,
        }
    }

    pub fn new_user(resource_id: ResourceId) -> Self {
        Self::with_kind(NodeKind::User { resource_id }, resource_id.to_string())
    }

    pub fn new_project(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Project { project_id }, name.into())
    }

    pub fn new_category(category_id: CategoryId, name: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Category { category_id }, name.into())
    }

    pub fn new_bug(
        bug_id: BugId,
        weight: i64,
        due_date: Option<Timestamp>,
        previous_bug: Option<BugId>,
        owning_resource: ResourceId,
    ) -> Self {
        let bug = BugData {
            bug_id,
            handler_id: owning_resource,
            weight,
            due_date,
            previous_bug,
            ledger: WorkLedger::new(),
            status: ScheduleStatus::Pending,
        };
        Self::with_kind(NodeKind::Bug(Box::new(bug)), bug_id.to_string())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_child(mut self, child: TaskNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn bug(&self) -> Option<&BugData> {
        match &self.kind {
            NodeKind::Bug(bug) => Some(bug),
            _ => None,
        }
    }

    pub fn bug_mut(&mut self) -> Option<&mut BugData> {
        match &mut self.kind {
            NodeKind::Bug(bug) => Some(bug),
            _ => None,
        }
    }

    pub fn is_bug(&self) -> bool {
        matches!(self.kind, NodeKind::Bug(_))
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    pub fn is_computed(&self) -> bool {
        self.state == ComputeState::Computed
    }

    /// `true` for levels whose children are themselves grouping nodes.
    pub fn groups_internal_nodes(&self) -> bool {
        matches!(self.kind, NodeKind::User { .. } | NodeKind::Project { .. })
    }

    /// All bug nodes of this subtree, in pre-order.
    pub fn bugs(&self) -> Vec<&TaskNode> {
        let mut out = Vec::new();
        self.collect_bugs(&mut out);
        out
    }

    fn collect_bugs<'a>(&'a self, out: &mut Vec<&'a TaskNode>) {
        if self.is_bug() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_bugs(out);
        }
    }

    /// `true` once the projected end lies after the bug's due date.
    /// Always `false` for non-bug nodes, bugs without a due date, and bugs
    /// that are not aggregated yet.
    pub fn is_past_due(&self) -> bool {
        match (self.bug().and_then(|bug| bug.due_date), self.window) {
            (Some(due), Some(window)) => window.end > due,
            _ => false,
        }
    }

    /// Sum of the ledger totals of every bug in this subtree.
    pub fn ledger_totals(&self, categories: &WorkCategorySet) -> WorkTotals {
        let mut totals = WorkTotals::default();
        for node in self.bugs() {
            if let Some(bug) = node.bug() {
                totals += bug.ledger.totals(categories);
            }
        }
        totals
    }
}

/// Ordered list of user roots produced from one record stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskForest {
    pub users: Vec<TaskNode>,
}

impl TaskForest {
    pub fn new(users: Vec<TaskNode>) -> Self {
        Self { users }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// All bug nodes, user by user, in pre-order.
    pub fn bugs(&self) -> Vec<&TaskNode> {
        self.users.iter().flat_map(|user| user.bugs()).collect()
    }

    pub fn find_bug(&self, bug_id: BugId) -> Option<&TaskNode> {
        self.bugs()
            .into_iter()
            .find(|node| node.bug().map(|bug| bug.bug_id) == Some(bug_id))
    }

    pub fn user(&self, resource_id: ResourceId) -> Option<&TaskNode> {
        self.users
            .iter()
            .find(|user| matches!(user.kind, NodeKind::User { resource_id: id } if id == resource_id))
    }
}
