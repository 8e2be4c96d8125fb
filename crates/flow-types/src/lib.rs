//! Shared API Types for the trace flow explorer
//!
//! This crate is the SINGLE SOURCE OF TRUTH for all types crossing the
//! tracing backend's HTTP boundary.
//!
//! ## Boundaries
//!
//! ```text
//! ┌──────────────────┐         ┌──────────────────┐
//! │  Tracing backend │  JSON   │  flow-graph /    │
//! │  (/api/flows)    │ ──────► │  flow-ui         │
//! └──────────────────┘         └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. Wire names are camelCase, enum values SCREAMING_SNAKE_CASE
//! 2. Raw graph records are lenient: every field is optional here and the
//!    graph builder decides what is required
//! 3. Timestamps and durations accept the backend's native encodings

mod de;
pub mod dependency;
pub mod explanation;
pub mod trace;

use serde::{Deserialize, Serialize};

pub use dependency::*;
pub use explanation::*;
pub use trace::*;

// ============================================================================
// RAW FLOW GRAPH (GET /flows/{traceId})
// ============================================================================

/// Flow graph payload exactly as the backend returns it.
///
/// `nodes`/`edges` stay `Option` so a payload that omits them can be told
/// apart from an empty graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlowGraph {
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub root_service: Option<String>,
    #[serde(default)]
    pub root_endpoint: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub span_count: Option<u32>,
    #[serde(default)]
    pub nodes: Option<Vec<RawServiceNode>>,
    #[serde(default)]
    pub edges: Option<Vec<RawCallEdge>>,
}

/// Service/endpoint node as sent by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawServiceNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    /// Average latency in milliseconds
    #[serde(default, deserialize_with = "de::opt_millis")]
    pub avg_latency: Option<f64>,
    #[serde(default)]
    pub error_rate: Option<f64>,
    #[serde(default)]
    pub request_count: Option<u64>,
    #[serde(default)]
    pub span_id: Option<String>,
}

/// Call edge as sent by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCallEdge {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source_node_id: Option<String>,
    #[serde(default)]
    pub target_node_id: Option<String>,
    #[serde(default)]
    pub source_service: Option<String>,
    #[serde(default)]
    pub target_service: Option<String>,
    #[serde(default)]
    pub metrics: Option<RawEdgeMetrics>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub sample_trace_ids: Vec<String>,
}

/// Per-edge metrics. Latencies are milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdgeMetrics {
    #[serde(default, deserialize_with = "de::opt_millis")]
    pub avg_latency: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_millis")]
    pub p95_latency: Option<f64>,
    #[serde(default)]
    pub error_rate: Option<f64>,
    #[serde(default)]
    pub request_count: Option<u64>,
    #[serde(default)]
    pub timeout_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_arrays_stay_none() {
        let raw: RawFlowGraph = serde_json::from_str(r#"{"traceId":"abc"}"#).unwrap();
        assert_eq!(raw.trace_id.as_deref(), Some("abc"));
        assert!(raw.nodes.is_none());
        assert!(raw.edges.is_none());
    }

    #[test]
    fn test_empty_arrays_are_some() {
        let raw: RawFlowGraph = serde_json::from_str(r#"{"nodes":[],"edges":[]}"#).unwrap();
        assert_eq!(raw.nodes, Some(vec![]));
        assert_eq!(raw.edges, Some(vec![]));
    }

    #[test]
    fn test_node_wire_names() {
        let json = r#"{
            "id": "checkout:GET:_cart",
            "serviceName": "checkout",
            "endpoint": "/cart",
            "method": "GET",
            "type": "ENTRY",
            "health": "DEGRADED",
            "avgLatency": 612.5,
            "errorRate": 0.02,
            "requestCount": 40
        }"#;
        let node: RawServiceNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type.as_deref(), Some("ENTRY"));
        assert_eq!(node.avg_latency, Some(612.5));
        assert_eq!(node.request_count, Some(40));
    }

    #[test]
    fn test_edge_duration_strings_become_millis() {
        let json = r#"{
            "id": "a->b",
            "sourceNodeId": "a",
            "targetNodeId": "b",
            "metrics": {"avgLatency": "PT1.5S", "p95Latency": "PT2M", "errorRate": 0.0},
            "status": "SLOW"
        }"#;
        let edge: RawCallEdge = serde_json::from_str(json).unwrap();
        let metrics = edge.metrics.unwrap();
        assert_eq!(metrics.avg_latency, Some(1500.0));
        assert_eq!(metrics.p95_latency, Some(120_000.0));
    }
}
