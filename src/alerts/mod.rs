//! Bounded in-memory alert log for dashboard display.
//!
//! The log is the only state shared across requests. It holds the most
//! recent alerts newest-first and evicts the oldest entries in the same
//! critical section as the insert, so the capacity bound holds at all
//! times, including under concurrent appends. Alerts live for the process
//! lifetime only; durable storage sits behind an external system.

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Maximum number of alerts retained.
pub const MAX_ALERTS: usize = 50;

/// Alert severity, rendered on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Markers that escalate an event to `Severity::Error`. Matched
/// case-insensitively against the crime name and the event summary.
const ERROR_MARKERS: &[&str] = &[
    "violence",
    "arson",
    "assault",
    "shooting",
    "explosion",
    "fighting",
    "abuse",
];

impl Severity {
    /// Derive severity from the crime name and event summary.
    pub fn for_event(crime_type: &str, summary: &str) -> Self {
        let crime_type = crime_type.to_lowercase();
        let summary = summary.to_lowercase();

        let escalated = ERROR_MARKERS
            .iter()
            .any(|m| crime_type.contains(m) || summary.contains(m));

        if escalated {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

/// A recorded crime alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "crimeTypeID")]
    pub crime_type_id: String,
    pub crime_type: String,
    pub summary: String,
    pub severity: Severity,
    pub notifications_sent: usize,
    pub timestamp: DateTime<Utc>,
}

/// Alert fields supplied by the ingestion pipeline; id and timestamp are
/// assigned at append time.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub crime_type_id: String,
    pub crime_type: String,
    pub summary: String,
    pub severity: Severity,
    pub notifications_sent: usize,
}

/// Bounded, most-recent-first alert store.
pub struct AlertLog {
    capacity: usize,
    inner: Mutex<VecDeque<Alert>>,
}

impl AlertLog {
    /// Create a log with the standard capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_ALERTS)
    }

    /// Create a log with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Assign an id and timestamp, insert at the head, and evict anything
    /// beyond capacity. Insert and eviction happen under one lock
    /// acquisition.
    pub fn append(&self, new: NewAlert) -> Alert {
        let alert = Alert {
            id: next_alert_id(),
            crime_type_id: new.crime_type_id,
            crime_type: new.crime_type,
            summary: new.summary,
            severity: new.severity,
            notifications_sent: new.notifications_sent,
            timestamp: Utc::now(),
        };

        let mut alerts = self.inner.lock().unwrap();
        alerts.push_front(alert.clone());
        alerts.truncate(self.capacity);
        drop(alerts);

        tracing::info!("Alert recorded: {} ({})", alert.crime_type, alert.id);
        alert
    }

    /// Most-recent-first listing, truncated to `limit`.
    pub fn list(&self, limit: usize) -> Vec<Alert> {
        let alerts = self.inner.lock().unwrap();
        alerts.iter().take(limit).cloned().collect()
    }

    /// Look up a single alert by id.
    pub fn get(&self, id: &str) -> Option<Alert> {
        let alerts = self.inner.lock().unwrap();
        alerts.iter().find(|a| a.id == id).cloned()
    }

    /// Drop all alerts.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
        tracing::info!("Alert log cleared");
    }

    /// Number of alerts currently retained.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate an alert id: insertion timestamp plus a random suffix to
/// disambiguate same-millisecond inserts.
fn next_alert_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("alert-{}-{}", millis, suffix.to_lowercase())
}
