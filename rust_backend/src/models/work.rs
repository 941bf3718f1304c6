//! Work categories and the per-bug minute ledger.
//!
//! Every bug tracks three minute maps keyed by work category: the original
//! estimate, the work already done and the work still remaining. The ledger
//! derives the bug totals from them once and memoizes the result.
//!
//! # Invariants
//! - A category missing from a map counts as 0.
//! - `remaining >= 0` and `overdue >= 0` for every input.
//! - `estimate == done + remaining` exactly.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

/// Code of one configured kind of work (e.g. "design", "coding").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkCategory(String);

impl WorkCategory {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed, configured set of work categories, in configuration order.
///
/// Aggregation only ever iterates this set, so records for unknown
/// categories never contribute to remaining or overdue minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCategorySet {
    categories: Vec<WorkCategory>,
}

impl WorkCategorySet {
    /// Builds a set from category codes, dropping blank and duplicate codes.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categories: Vec<WorkCategory> = Vec::new();
        for code in codes {
            let code: String = code.into();
            let code = code.trim();
            if code.is_empty() || categories.iter().any(|c| c.code() == code) {
                continue;
            }
            categories.push(WorkCategory::new(code));
        }
        Self { categories }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.categories.iter().any(|c| c.code() == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkCategory> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Which ledger map a minute value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinutesKind {
    #[serde(alias = "est")]
    Estimate,
    Done,
    #[serde(alias = "todo")]
    Remaining,
}

/// Derived totals of a ledger, or sums of several ledgers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTotals {
    pub estimate: i64,
    pub done: i64,
    pub remaining: i64,
    pub overdue: i64,
}

impl WorkTotals {
    /// The larger of the stored estimate and `done + remaining`.
    pub fn real_estimate(&self) -> i64 {
        self.estimate.max(self.done + self.remaining)
    }
}

impl AddAssign for WorkTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.estimate += rhs.estimate;
        self.done += rhs.done;
        self.remaining += rhs.remaining;
        self.overdue += rhs.overdue;
    }
}

/// Estimated / done / remaining minutes of one bug, per work category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkLedger {
    estimated: BTreeMap<String, i64>,
    done: BTreeMap<String, i64>,
    remaining: BTreeMap<String, i64>,
    #[serde(skip)]
    totals: OnceCell<WorkTotals>,
}

impl PartialEq for WorkLedger {
    fn eq(&self, other: &Self) -> bool {
        self.estimated == other.estimated
            && self.done == other.done
            && self.remaining == other.remaining
    }
}

impl WorkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `minutes` for `category` in the map selected by `kind`,
    /// replacing any previous value. Invalidates memoized totals.
    pub fn set(&mut self, kind: MinutesKind, category: impl Into<String>, minutes: i64) {
        self.map_mut(kind).insert(category.into(), minutes);
        self.totals.take();
    }

    pub fn get(&self, kind: MinutesKind, category: &str) -> Option<i64> {
        self.map(kind).get(category).copied()
    }

    /// Totals of this ledger over `categories`, computed on first call.
    ///
    /// The first computation is memoized; later calls return it unchanged
    /// until the ledger is mutated through [`WorkLedger::set`].
    pub fn totals(&self, categories: &WorkCategorySet) -> WorkTotals {
        *self.totals.get_or_init(|| self.compute_totals(categories))
    }

    /// `true` once totals have been computed and not invalidated since.
    pub fn has_totals(&self) -> bool {
        self.totals.get().is_some()
    }

    fn compute_totals(&self, categories: &WorkCategorySet) -> WorkTotals {
        let done: i64 = self.done.values().sum();

        let mut remaining = 0;
        for category in categories.iter() {
            let code = category.code();
            if let Some(todo) = self.remaining.get(code) {
                remaining += todo;
            } else if let Some(estimate) = self.estimated.get(code) {
                let done_here = self.done.get(code).copied().unwrap_or(0);
                remaining += (estimate - done_here).max(0);
            }
        }
        let remaining = remaining.max(0);

        // Summed over categories before clamping: savings in one category
        // offset extra work in another.
        let overdue: i64 = categories
            .iter()
            .map(|category| {
                let code = category.code();
                self.done.get(code).copied().unwrap_or(0)
                    + self.remaining.get(code).copied().unwrap_or(0)
                    - self.estimated.get(code).copied().unwrap_or(0)
            })
            .sum();

        WorkTotals {
            estimate: done + remaining,
            done,
            remaining,
            overdue: overdue.max(0),
        }
    }

    fn map(&self, kind: MinutesKind) -> &BTreeMap<String, i64> {
        match kind {
            MinutesKind::Estimate => &self.estimated,
            MinutesKind::Done => &self.done,
            MinutesKind::Remaining => &self.remaining,
        }
    }

    fn map_mut(&mut self, kind: MinutesKind) -> &mut BTreeMap<String, i64> {
        match kind {
            MinutesKind::Estimate => &mut self.estimated,
            MinutesKind::Done => &mut self.done,
            MinutesKind::Remaining => &mut self.remaining,
        }
    }
}
