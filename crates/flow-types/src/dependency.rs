//! Service dependency topology (GET /flows/dependencies)
//!
//! Aggregated over every trace in a lookback window: which service calls
//! which, with per-pair traffic metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One caller → callee pair observed in the window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDependency {
    pub source_service: String,
    pub target_service: String,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub request_count: u64,
    #[serde(default)]
    pub avg_latency_ms: f64,
    #[serde(default)]
    pub p95_latency_ms: f64,
    #[serde(default)]
    pub error_rate: f64,
    #[serde(default, deserialize_with = "crate::de::opt_timestamp")]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::de::opt_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraph {
    #[serde(default)]
    pub dependencies: Vec<ServiceDependency>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default, deserialize_with = "crate::de::opt_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_traces: u64,
}

impl DependencyGraph {
    /// Services `service` calls, first-seen order, no duplicates
    pub fn downstream_services(&self, service: &str) -> Vec<&str> {
        distinct(
            self.dependencies
                .iter()
                .filter(|d| d.source_service == service)
                .map(|d| d.target_service.as_str()),
        )
    }

    /// Services that call `service`
    pub fn upstream_services(&self, service: &str) -> Vec<&str> {
        distinct(
            self.dependencies
                .iter()
                .filter(|d| d.target_service == service)
                .map(|d| d.source_service.as_str()),
        )
    }

    pub fn fan_out(&self, service: &str) -> usize {
        self.downstream_services(service).len()
    }

    pub fn fan_in(&self, service: &str) -> usize {
        self.upstream_services(service).len()
    }

    /// `services` followed by any service that only shows up in a dependency
    pub fn service_names(&self) -> Vec<&str> {
        let listed = self.services.iter().map(String::as_str);
        let referenced = self
            .dependencies
            .iter()
            .flat_map(|d| [d.source_service.as_str(), d.target_service.as_str()]);
        distinct(listed.chain(referenced))
    }

    /// (caller, callee) pairs, one per dependency
    pub fn call_pairs(&self) -> Vec<(&str, &str)> {
        self.dependencies
            .iter()
            .map(|d| (d.source_service.as_str(), d.target_service.as_str()))
            .collect()
    }

    pub fn dependency(&self, source: &str, target: &str) -> Option<&ServiceDependency> {
        self.dependencies
            .iter()
            .find(|d| d.source_service == source && d.target_service == target)
    }
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dep(source: &str, target: &str) -> ServiceDependency {
        ServiceDependency {
            source_service: source.into(),
            target_service: target.into(),
            ..Default::default()
        }
    }

    fn topology() -> DependencyGraph {
        DependencyGraph {
            dependencies: vec![
                dep("gateway", "orders"),
                dep("gateway", "users"),
                dep("orders", "postgres"),
                dep("users", "postgres"),
                // same pair over a second protocol
                dep("gateway", "orders"),
            ],
            services: vec!["gateway".into(), "orders".into(), "users".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_upstream_and_downstream_are_distinct() {
        let graph = topology();
        assert_eq!(graph.downstream_services("gateway"), vec!["orders", "users"]);
        assert_eq!(graph.upstream_services("postgres"), vec!["orders", "users"]);
        assert_eq!(graph.fan_out("gateway"), 2);
        assert_eq!(graph.fan_in("postgres"), 2);
        assert_eq!(graph.fan_in("gateway"), 0);
        assert_eq!(graph.fan_out("unknown"), 0);
    }

    #[test]
    fn test_service_names_include_unlisted_callees() {
        assert_eq!(
            topology().service_names(),
            vec!["gateway", "orders", "users", "postgres"]
        );
    }

    #[test]
    fn test_from_backend() {
        let json = r#"{
            "dependencies": [{
                "sourceService": "checkout",
                "targetService": "payment",
                "protocol": "HTTP",
                "requestCount": 120,
                "avgLatencyMs": 84.5,
                "p95LatencyMs": 310.0,
                "errorRate": 0.02,
                "firstSeen": "2024-05-01T10:00:00Z",
                "lastSeen": 1714561200.5
            }],
            "services": ["checkout", "payment"],
            "lastUpdated": "2024-05-01T11:00:00Z",
            "totalTraces": 42
        }"#;
        let graph: DependencyGraph = serde_json::from_str(json).unwrap();
        assert_eq!(graph.total_traces, 42);
        let d = graph.dependency("checkout", "payment").unwrap();
        assert_eq!(d.request_count, 120);
        assert_eq!(d.protocol.as_deref(), Some("HTTP"));
        assert!(d.first_seen.is_some());
        assert!(d.last_seen.is_some());
        assert!(graph.dependency("payment", "checkout").is_none());
    }
}
