/// Threshold alerts over the latest host and container samples

use serde::Serialize;
use std::fmt;

use crate::core::models::{ContainerMetricSample, HostMetricSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Alert {
    fn warning(title: impl Into<String>, message: String) -> Self {
        Self {
            title: title.into(),
            message,
            severity: Severity::Warning,
        }
    }
}

/// One alert per metric strictly above `threshold`, host first.
/// Recomputed on every render; no history.
pub fn evaluate<'a>(
    host: Option<&HostMetricSample>,
    containers: impl IntoIterator<Item = &'a ContainerMetricSample>,
    threshold: f64,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(host) = host {
        if host.cpu_percent > threshold {
            alerts.push(Alert::warning("High CPU Usage", format!("Host CPU usage is {:.1}%", host.cpu_percent)));
        }
        if host.memory_percent > threshold {
            alerts.push(Alert::warning("High Memory Usage", format!("Host RAM usage is {:.1}%", host.memory_percent)));
        }
    }

    for container in containers {
        let title = format!("Container: {}", container.container_name);
        if container.cpu_percent > threshold {
            alerts.push(Alert::warning(title.clone(), format!("CPU usage is {:.1}%", container.cpu_percent)));
        }
        if container.memory_percent > threshold {
            alerts.push(Alert::warning(title, format!("RAM usage is {:.1}%", container.memory_percent)));
        }
    }

    alerts
}
