//! Turns a flat list of device readings into the branch/silo hierarchy.
//!
//! Everything here is a pure function of its input: no I/O, no clock, no
//! shared state. The dashboard calls [`build_view`] once per refresh and
//! replaces its previous view wholesale.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{Branch, RawReading, Summary, LOW_CAPACITY_THRESHOLD};

// ---

/// Everything the renderer draws, rebuilt from scratch on each fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewModel {
    pub branches: Vec<Branch>,
    pub summary: Summary,
}

impl ViewModel {
    pub fn branch(&self, branch_id: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == branch_id)
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// Recompute the whole view model from a fetch result.
pub fn build_view(readings: &[RawReading]) -> ViewModel {
    // ---
    let branches = build_branches(readings);
    let summary = build_summary(readings);
    ViewModel { branches, summary }
}

/// Group readings by province in a single pass.
///
/// Branch order is the order in which each province first appears; silo
/// order within a branch is input order. Readings with a blank province are
/// skipped.
pub fn build_branches(readings: &[RawReading]) -> Vec<Branch> {
    // ---
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut branches: Vec<Branch> = Vec::new();

    for (index, reading) in readings.iter().enumerate() {
        let Some(province) = reading.province_key() else {
            tracing::trace!("Skipping reading {} without province", index);
            continue;
        };

        let slot = *slots.entry(province).or_insert_with(|| {
            branches.push(Branch::new(province));
            branches.len() - 1
        });
        branches[slot].push(reading.to_silo(index));
    }

    branches.retain(|b| !b.silos.is_empty());

    tracing::debug!(
        "Aggregated {} readings into {} branches",
        readings.len(),
        branches.len()
    );
    branches
}

/// Whole-dataset statistics, computed straight from the readings.
///
/// Agrees with summing the totals of `build_branches(readings)`.
pub fn build_summary(readings: &[RawReading]) -> Summary {
    // ---
    let mut provinces: HashSet<&str> = HashSet::new();
    let mut summary = Summary::default();

    for reading in readings {
        let Some(province) = reading.province_key() else {
            continue;
        };
        provinces.insert(province);

        let (capacity, volume) = (reading.capacity(), reading.volume());
        summary.total_silos += 1;
        summary.total_capacity += capacity;
        summary.total_used += volume;
        if volume / capacity * 100.0 < LOW_CAPACITY_THRESHOLD {
            summary.total_low_capacity += 1;
        }
    }

    summary.total_branches = provinces.len();
    summary.finish()
}
