// fisand-core/src/report.rs
//! Per-entry outcomes of a tree walk.
//!
//! Failures local to one entry are recorded here instead of aborting the
//! walk, so callers can inspect what went wrong once it completes.

use std::path::PathBuf;

use fisand_common::dependency::DependencyMap;
use fisand_common::error::FisandError;

#[derive(Debug, Clone)]
pub enum EntryAction {
    /// Directory created (or already present).
    Created,
    /// File fetched and written.
    Written,
    /// Manifest read for its dependency section.
    Inspected,
    /// Excluded by the exclusion policy.
    Skipped,
    /// Entry of an unrecognized kind.
    Ignored,
    Failed(FisandError),
}

#[derive(Debug, Clone)]
pub struct EntryOutcome {
    pub remote_path: String,
    pub local_path: PathBuf,
    pub action: EntryAction,
}

/// Result of materializing one module tree.
#[derive(Debug, Clone, Default)]
pub struct Materialization {
    /// Dependencies from the last manifest visited; empty if none was found.
    pub dependencies: DependencyMap,
    pub outcomes: Vec<EntryOutcome>,
}

impl Materialization {
    pub fn record(
        &mut self,
        remote_path: impl Into<String>,
        local_path: impl Into<PathBuf>,
        action: EntryAction,
    ) {
        self.outcomes.push(EntryOutcome {
            remote_path: remote_path.into(),
            local_path: local_path.into(),
            action,
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = (&EntryOutcome, &FisandError)> {
        self.outcomes.iter().filter_map(|o| match &o.action {
            EntryAction::Failed(e) => Some((o, e)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    fn count(&self, wanted: fn(&EntryAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| wanted(&o.action)).count()
    }

    pub fn written_count(&self) -> usize {
        self.count(|a| matches!(a, EntryAction::Written))
    }

    pub fn inspected_count(&self) -> usize {
        self.count(|a| matches!(a, EntryAction::Inspected))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|a| matches!(a, EntryAction::Skipped | EntryAction::Ignored))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|a| matches!(a, EntryAction::Failed(_)))
    }

    /// Appends another walk's outcomes; dependencies are left untouched.
    pub fn merge_outcomes(&mut self, other: Materialization) {
        self.outcomes.extend(other.outcomes);
    }
}
