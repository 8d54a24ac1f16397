//! Which branch is active and which of its silos are charted.
//!
//! Selection survives refreshes by matching ids against the freshly built
//! branches, never by holding on to the previous `Branch` values.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{Branch, Silo};

// ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    active_branch: Option<String>,
    silo_ids: BTreeSet<String>,
}

impl Selection {
    // ---
    pub fn active_branch(&self) -> Option<&str> {
        self.active_branch.as_deref()
    }

    pub fn is_selected(&self, silo_id: &str) -> bool {
        self.silo_ids.contains(silo_id)
    }

    /// Make `branch_id` active and select all of its silos.
    ///
    /// Returns `false` and leaves the selection untouched if the branch is
    /// not in `branches`.
    pub fn select(&mut self, branch_id: &str, branches: &[Branch]) -> bool {
        // ---
        let Some(branch) = branches.iter().find(|b| b.id == branch_id) else {
            return false;
        };
        self.seed(branch);
        true
    }

    /// Flip one silo in or out of the selection.
    pub fn toggle_silo(&mut self, silo_id: &str) {
        if !self.silo_ids.remove(silo_id) {
            self.silo_ids.insert(silo_id.to_string());
        }
    }

    /// Add every silo of the active branch. No-op without an active branch.
    pub fn select_all_silos(&mut self, branches: &[Branch]) {
        if let Some(branch) = self.active(branches) {
            self.silo_ids
                .extend(branch.silos.iter().map(|s| s.id.clone()));
        }
    }

    pub fn deselect_all_silos(&mut self) {
        self.silo_ids.clear();
    }

    /// Carry the selection over to a freshly aggregated branch list.
    ///
    /// - nothing active: auto-select the first branch with all its silos
    /// - active branch gone: same as above
    /// - otherwise: keep the branch, drop ids that no longer exist in it
    pub fn reconcile(&mut self, branches: &[Branch]) {
        // ---
        match self.active(branches) {
            Some(branch) => {
                self.silo_ids.retain(|id| branch.silo(id).is_some());
            }
            None => {
                if let Some(previous) = self.active_branch.take() {
                    tracing::info!("Selected branch {} no longer present", previous);
                }
                self.silo_ids.clear();
                if let Some(first) = branches.first() {
                    tracing::debug!("Auto-selected branch: {}", first.id);
                    self.seed(first);
                }
            }
        }
    }

    /// The active branch, if it exists in `branches`.
    pub fn active<'a>(&self, branches: &'a [Branch]) -> Option<&'a Branch> {
        let active = self.active_branch.as_deref()?;
        branches.iter().find(|b| b.id == active)
    }

    /// Selected silos of the active branch, in branch order.
    pub fn selected_silos<'a>(&self, branches: &'a [Branch]) -> Vec<&'a Silo> {
        self.active(branches)
            .map(|b| b.silos.iter().filter(|s| self.is_selected(&s.id)).collect())
            .unwrap_or_default()
    }

    fn seed(&mut self, branch: &Branch) {
        self.active_branch = Some(branch.id.clone());
        self.silo_ids = branch.silos.iter().map(|s| s.id.clone()).collect();
    }
}
