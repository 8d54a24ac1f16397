//! Session controller for the dashboard.
//!
//! A single [`Dashboard`] owns everything that used to be ambient page
//! state: the aggregated view, the selection, the colour cache and the toast
//! queue. Routes reach it through `AppState` and never hold their own copies.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::aggregator::{build_view, ViewModel};
use crate::demo::demo_readings;
use crate::error::FetchError;
use crate::models::{Branch, RawReading, Summary};
use crate::palette::ColorPalette;
use crate::selection::Selection;

// ---

/// Maximum queued notifications; older ones are dropped first.
pub const NOTIFICATION_CAPACITY: usize = 32;

/// Where the current view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Nothing loaded yet.
    Pending,
    Live,
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient, toast-style message for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// One row of the selected-silo table, also used as a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiloRow {
    pub id: String,
    pub name: String,
    pub material: String,
    pub current_amount: f64,
    pub capacity: f64,
    pub percent: i64,
    pub is_low_capacity: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStatus {
    pub source: DataSource,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub branches: usize,
    pub silos: usize,
    pub active_branch: Option<String>,
}

#[derive(Debug)]
pub struct Dashboard {
    view: ViewModel,
    selection: Selection,
    palette: ColorPalette,
    source: DataSource,
    last_refreshed: Option<DateTime<Utc>>,
    notifications: VecDeque<Notification>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    // ---
    pub fn new() -> Self {
        Dashboard {
            view: ViewModel::default(),
            selection: Selection::default(),
            palette: ColorPalette::new(),
            source: DataSource::Pending,
            last_refreshed: None,
            notifications: VecDeque::with_capacity(NOTIFICATION_CAPACITY),
        }
    }

    /// Rebuild the view model from a fetch result.
    ///
    /// This is the only place the view is replaced. A failed fetch, or one
    /// that yields no branches, is substituted with the demo dataset.
    pub fn apply_fetch(
        &mut self,
        fetched: Result<Vec<RawReading>, FetchError>,
        now: DateTime<Utc>,
    ) -> DataSource {
        // ---
        let (view, source) = match fetched {
            Ok(readings) => {
                let view = build_view(&readings);
                if view.is_empty() {
                    warn!(
                        "No branches in {} live readings, using demo data",
                        readings.len()
                    );
                    (build_view(&demo_readings()), DataSource::Demo)
                } else {
                    (view, DataSource::Live)
                }
            }
            Err(e) => {
                error!("Failed to fetch silo readings: {}", e);
                self.notify(
                    NotificationLevel::Error,
                    format!("Failed to load data: {}", e.user_message()),
                    now,
                );
                (build_view(&demo_readings()), DataSource::Demo)
            }
        };

        self.view = view;
        self.source = source;
        self.last_refreshed = Some(now);
        self.selection.reconcile(&self.view.branches);

        info!(
            "View rebuilt from {:?} data: {} branches, {} silos",
            source, self.view.summary.total_branches, self.view.summary.total_silos
        );
        source
    }

    pub fn branches(&self) -> &[Branch] {
        &self.view.branches
    }

    pub fn branch(&self, branch_id: &str) -> Option<&Branch> {
        self.view.branch(branch_id)
    }

    pub fn summary(&self) -> &Summary {
        &self.view.summary
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Make a branch active. `false` if it does not exist.
    pub fn select(&mut self, branch_id: &str) -> bool {
        self.selection.select(branch_id, &self.view.branches)
    }

    /// Toggle a silo of the active branch. `false` if the silo is not part
    /// of the active branch.
    pub fn toggle_silo(&mut self, silo_id: &str) -> bool {
        // ---
        let in_active = self
            .selection
            .active(&self.view.branches)
            .is_some_and(|b| b.silo(silo_id).is_some());
        if in_active {
            self.selection.toggle_silo(silo_id);
        }
        in_active
    }

    pub fn select_all_silos(&mut self) {
        self.selection.select_all_silos(&self.view.branches);
    }

    pub fn deselect_all_silos(&mut self) {
        self.selection.deselect_all_silos();
    }

    pub fn color_for(&mut self, name: &str) -> &'static str {
        self.palette.color_for(name)
    }

    pub fn reset_colors(&mut self) {
        self.palette.reset();
    }

    /// Rows for the selected silos of the active branch, colours assigned in
    /// branch order.
    pub fn selected_rows(&mut self) -> Vec<SiloRow> {
        // ---
        let palette = &mut self.palette;
        self.selection
            .selected_silos(&self.view.branches)
            .into_iter()
            .map(|silo| SiloRow {
                id: silo.id.clone(),
                name: silo.name.clone(),
                material: silo.material.clone(),
                current_amount: silo.current_amount,
                capacity: silo.capacity,
                percent: silo.rounded_percentage(),
                is_low_capacity: silo.is_low_capacity(),
                last_updated: silo.last_updated,
                color: palette.color_for(&silo.name),
            })
            .collect()
    }

    /// Queue a toast, evicting the oldest when full.
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>, now: DateTime<Utc>) {
        if self.notifications.len() == NOTIFICATION_CAPACITY {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            level,
            message: message.into(),
            at: now,
        });
    }

    /// Hand all pending toasts to the renderer.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub fn status(&self) -> DashboardStatus {
        DashboardStatus {
            source: self.source,
            last_refreshed: self.last_refreshed,
            branches: self.view.summary.total_branches,
            silos: self.view.summary.total_silos,
            active_branch: self.selection.active_branch().map(str::to_string),
        }
    }
}
