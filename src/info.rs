use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AppSettings;
use crate::identity;
use crate::metrics::MetricsRegistry;

pub const APP_NAME: &str = "ocp-demo-app";
pub const INFO_COUNTER: &str = "demo.info.requests.total";

/// Which pod answered, and which version/colour it runs.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InfoReport {
    pub app: String,
    pub version: String,
    pub colour: String,
    pub hostname: String,
    pub timestamp: String,
}

pub fn report(settings: &AppSettings, metrics: &MetricsRegistry) -> InfoReport {
    metrics.counter(INFO_COUNTER).increment();

    InfoReport {
        app: APP_NAME.to_string(),
        version: settings.version.clone(),
        colour: settings.colour.clone(),
        hostname: identity::resolve_hostname(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_fields() {
        let settings = AppSettings {
            version: "2.0.0".to_string(),
            colour: "green".to_string(),
        };
        let metrics = MetricsRegistry::new();
        let report = report(&settings, &metrics);

        assert_eq!(report.app, APP_NAME);
        assert_eq!(report.version, "2.0.0");
        assert_eq!(report.colour, "green");
        assert!(!report.hostname.is_empty());
        assert!(report.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[test]
    fn test_every_call_is_counted() {
        let settings = AppSettings::default();
        let metrics = MetricsRegistry::new();
        for _ in 0..3 {
            report(&settings, &metrics);
        }
        assert_eq!(metrics.counter(INFO_COUNTER).get(), 3);
    }

    #[test]
    fn test_key_order() {
        let metrics = MetricsRegistry::new();
        let json = serde_json::to_string(&report(&AppSettings::default(), &metrics)).unwrap();
        let app = json.find("\"app\"").unwrap();
        let version = json.find("\"version\"").unwrap();
        let colour = json.find("\"colour\"").unwrap();
        let hostname = json.find("\"hostname\"").unwrap();
        let timestamp = json.find("\"timestamp\"").unwrap();
        assert!(app < version && version < colour && colour < hostname && hostname < timestamp);
    }
}
