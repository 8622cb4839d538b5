/// Container registry: inventory, aggregate stats and the merged table
///
/// Inventory and stats come from two independent polls. The table shown to
/// the user joins the inventory with the latest metric sample per container
/// name; containers without metrics (stopped ones, usually) show zeros.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::core::api::ApiError;
use crate::core::models::{ContainerInventoryEntry, ContainerMetricSample, ContainerStats, ContainerStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Running,
    /// Anything that is not running
    Stopped,
}

impl StatusFilter {
    pub fn matches(&self, status: &ContainerStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Running => status.is_running(),
            StatusFilter::Stopped => !status.is_running(),
        }
    }

    /// Next filter in the TUI cycle
    pub fn next(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Running,
            StatusFilter::Running => StatusFilter::Stopped,
            StatusFilter::Stopped => StatusFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Running => "running",
            StatusFilter::Stopped => "stopped",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "running" => Ok(StatusFilter::Running),
            "stopped" => Ok(StatusFilter::Stopped),
            other => Err(format!("unknown status filter '{}' (expected all, running, stopped)", other)),
        }
    }
}

/// One row of the merged container table
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRow {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: ContainerStatus,
    pub uptime_label: String,
    pub uptime_display: String,
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub memory_percent: f64,
}

impl ContainerRow {
    fn merge(entry: &ContainerInventoryEntry, metrics: Option<&ContainerMetricSample>) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            image: entry.image.clone(),
            status: entry.status.clone(),
            uptime_label: entry.uptime_label.clone(),
            uptime_display: entry.uptime_display.clone(),
            cpu_percent: metrics.map(|m| m.cpu_percent).unwrap_or(0.0),
            memory_mb: metrics.map(|m| m.memory_used_mb).unwrap_or(0.0),
            memory_percent: metrics.map(|m| m.memory_percent).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContainerRegistry {
    pub inventory: Vec<ContainerInventoryEntry>,
    pub stats: ContainerStats,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_inventory(&mut self, result: Result<Vec<ContainerInventoryEntry>, ApiError>) {
        match result {
            Ok(containers) => {
                debug!(count = containers.len(), "Container inventory updated");
                self.inventory = containers;
            }
            Err(e) => warn!("Container inventory poll failed: {}", e),
        }
    }

    pub fn apply_stats(&mut self, result: Result<ContainerStats, ApiError>) {
        match result {
            Ok(stats) => self.stats = stats,
            Err(e) => warn!("Container stats poll failed: {}", e),
        }
    }

    /// Merge the inventory with the latest metrics (by name) and filter by status
    pub fn rows(&self, latest: &BTreeMap<&str, &ContainerMetricSample>, filter: StatusFilter) -> Vec<ContainerRow> {
        self.inventory
            .iter()
            .map(|entry| ContainerRow::merge(entry, latest.get(entry.name.as_str()).copied()))
            .filter(|row| filter.matches(&row.status))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&ContainerInventoryEntry> {
        self.inventory.iter().find(|c| c.name == name)
    }

    pub fn running_count(&self) -> usize {
        self.inventory.iter().filter(|c| c.status.is_running()).count()
    }
}
