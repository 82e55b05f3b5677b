use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback shown when the service reports no storage figure.
pub const STORAGE_UNKNOWN: &str = "N/A";

/// `/Health` payload. Only `status` is reliably present; component checks
/// arrive under `entries` or `checks` depending on the deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealthReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub storage: Option<Value>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, alias = "checks")]
    pub entries: BTreeMap<String, Value>,
}

impl HealthReport {
    /// Parse a `/Health` body. Plain-text bodies (`Healthy`) become the status.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<HealthReport>(body) {
            Ok(report) => report,
            Err(_) => {
                let status = body.trim().trim_matches('"');
                HealthReport {
                    status: (!status.is_empty()).then(|| status.to_string()),
                    ..Self::default()
                }
            }
        }
    }

    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("Unknown")
    }

    pub fn is_healthy(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("healthy") || s.eq_ignore_ascii_case("ok"))
            .unwrap_or(false)
    }

    pub fn storage_display(&self) -> String {
        match &self.storage {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => STORAGE_UNKNOWN.to_string(),
        }
    }

    /// `(component, state)` pairs for display, in name order.
    pub fn components(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, value)| {
                let state = match value {
                    Value::String(s) => s.clone(),
                    Value::Object(map) => map
                        .get("status")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown")
                        .to_string(),
                    other => other.to_string(),
                };
                (name.clone(), state)
            })
            .collect()
    }
}

/// Aggregated figures for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardStats {
    pub total_users: u64,
    pub active_users: u64,
    pub documents_processed: u64,
    pub storage_used: String,
    pub health: Option<HealthReport>,
}

impl DashboardStats {
    pub fn new(
        total_users: u64,
        active_users: u64,
        documents_processed: u64,
        health: Option<HealthReport>,
    ) -> Self {
        let storage_used = health
            .as_ref()
            .map(HealthReport::storage_display)
            .unwrap_or_else(|| STORAGE_UNKNOWN.to_string());
        Self {
            total_users,
            active_users,
            documents_processed,
            storage_used,
            health,
        }
    }
}

/// One row of the recent admin activity table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    #[serde(default)]
    pub admin: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, alias = "timestamp")]
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_report_components() {
        let json = r#"{"status": "Healthy", "storage": "452 GB",
                       "entries": {"database": {"status": "Healthy"}, "queue": "Degraded"}}"#;
        let report: HealthReport = serde_json::from_str(json).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.storage_display(), "452 GB");
        assert_eq!(
            report.components(),
            vec![
                ("database".to_string(), "Healthy".to_string()),
                ("queue".to_string(), "Degraded".to_string()),
            ]
        );
    }

    #[test]
    fn test_health_report_plain_text() {
        let report = HealthReport::from_body("Healthy");
        assert_eq!(report.status_label(), "Healthy");
        assert!(report.components().is_empty());

        let report = HealthReport::from_body("");
        assert_eq!(report.status_label(), "Unknown");
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_dashboard_stats_storage_fallback() {
        let stats = DashboardStats::new(10, 3, 40, None);
        assert_eq!(stats.storage_used, "N/A");

        let health: HealthReport = serde_json::from_str(r#"{"status": "Healthy"}"#).unwrap();
        let stats = DashboardStats::new(10, 3, 40, Some(health));
        assert_eq!(stats.storage_used, "N/A");
        assert!(stats.health.is_some());
    }
}
