//! Liveness and readiness checks in the MicroProfile Health layout
//! (`{"status": "UP", "checks": [...]}`).

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl HealthCheckResponse {
    pub fn up(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Up,
            data: BTreeMap::new(),
        }
    }

    pub fn down(name: &str) -> Self {
        Self {
            status: HealthStatus::Down,
            ..Self::up(name)
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

pub trait HealthCheck: Send + Sync {
    fn check(&self) -> HealthCheckResponse;
}

/// The process answers, so it is live.
pub struct AppLiveness;

impl HealthCheck for AppLiveness {
    fn check(&self) -> HealthCheckResponse {
        HealthCheckResponse::up("app-live").with_data("hostname", identity::resolve_hostname())
    }
}

/// Nothing to depend on yet; a database ping would go here.
pub struct AppReadiness;

impl HealthCheck for AppReadiness {
    fn check(&self) -> HealthCheckResponse {
        HealthCheckResponse::up("app-ready").with_data("status", "all systems nominal")
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<HealthCheckResponse>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Runs every check; the report is DOWN as soon as one check is.
pub fn run_checks(checks: &[&dyn HealthCheck]) -> HealthReport {
    let checks: Vec<HealthCheckResponse> = checks.iter().map(|c| c.check()).collect();
    let status = if checks.iter().all(|c| c.status == HealthStatus::Up) {
        HealthStatus::Up
    } else {
        HealthStatus::Down
    };
    HealthReport { status, checks }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl HealthCheck for Failing {
        fn check(&self) -> HealthCheckResponse {
            HealthCheckResponse::down("db").with_data("reason", "connection refused")
        }
    }

    #[test]
    fn test_liveness_is_up_with_hostname() {
        let report = run_checks(&[&AppLiveness]);
        assert!(report.is_up());
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].name, "app-live");
        assert!(report.checks[0].data.contains_key("hostname"));
    }

    #[test]
    fn test_readiness_is_up() {
        let report = run_checks(&[&AppReadiness]);
        assert!(report.is_up());
        assert_eq!(report.checks[0].name, "app-ready");
        assert_eq!(report.checks[0].data["status"], "all systems nominal");
    }

    #[test]
    fn test_one_failing_check_brings_report_down() {
        let report = run_checks(&[&AppReadiness, &Failing]);
        assert_eq!(report.status, HealthStatus::Down);
        assert_eq!(report.checks.len(), 2);
    }

    #[test]
    fn test_serialized_layout() {
        let json = serde_json::to_value(run_checks(&[&AppReadiness])).unwrap();
        assert_eq!(json["status"], "UP");
        assert_eq!(json["checks"][0]["name"], "app-ready");
        assert_eq!(json["checks"][0]["status"], "UP");
    }

    #[test]
    fn test_empty_data_is_omitted() {
        let json = serde_json::to_value(HealthCheckResponse::up("bare")).unwrap();
        assert!(json.get("data").is_none());
    }
}
