//! Graph model - normalised service nodes and call edges
//!
//! Raw backend records are lenient (everything optional); the types here are
//! what the rest of the engine relies on: defaults filled, numbers sanitised,
//! and every edge endpoint guaranteed to exist.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use flow_types::{FlowStatus, RawCallEdge, RawEdgeMetrics, RawFlowGraph, RawServiceNode};
use serde::Serialize;

use super::error::GraphError;

// =============================================================================
// ENUMS
// =============================================================================

/// Kind of service node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Entry,
    Internal,
    Database,
    External,
    Messaging,
    Cache,
    #[default]
    Unspecified,
}

impl FromStr for NodeType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "ENTRY" => Self::Entry,
            "INTERNAL" => Self::Internal,
            "DATABASE" => Self::Database,
            "EXTERNAL" => Self::External,
            "MESSAGING" => Self::Messaging,
            "CACHE" => Self::Cache,
            _ => Self::Unspecified,
        })
    }
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Entry => "ENTRY",
            NodeType::Internal => "INTERNAL",
            NodeType::Database => "DATABASE",
            NodeType::External => "EXTERNAL",
            NodeType::Messaging => "MESSAGING",
            NodeType::Cache => "CACHE",
            NodeType::Unspecified => "",
        }
    }

    /// Icon shown in the node header
    pub fn icon(&self) -> &'static str {
        match self {
            NodeType::Entry => "🚀",
            NodeType::Database => "🗄",
            NodeType::External => "🌐",
            NodeType::Messaging => "📨",
            NodeType::Cache => "⚡",
            NodeType::Internal | NodeType::Unspecified => "📦",
        }
    }
}

/// Node health as computed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeHealth {
    #[default]
    Healthy,
    Degraded,
    Failing,
}

impl FromStr for NodeHealth {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "DEGRADED" => Self::Degraded,
            "FAILING" => Self::Failing,
            _ => Self::Healthy,
        })
    }
}

impl NodeHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeHealth::Healthy => "HEALTHY",
            NodeHealth::Degraded => "DEGRADED",
            NodeHealth::Failing => "FAILING",
        }
    }
}

/// Call edge status as computed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeStatus {
    #[default]
    Normal,
    Slow,
    Failing,
    Timeout,
    Retrying,
}

impl FromStr for EdgeStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "SLOW" => Self::Slow,
            "FAILING" => Self::Failing,
            "TIMEOUT" => Self::Timeout,
            "RETRYING" => Self::Retrying,
            _ => Self::Normal,
        })
    }
}

impl EdgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::Normal => "NORMAL",
            EdgeStatus::Slow => "SLOW",
            EdgeStatus::Failing => "FAILING",
            EdgeStatus::Timeout => "TIMEOUT",
            EdgeStatus::Retrying => "RETRYING",
        }
    }
}

// =============================================================================
// NODES / EDGES
// =============================================================================

/// A service/endpoint in one trace's call graph
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNode {
    pub id: String,
    pub service_name: String,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub health: NodeHealth,
    /// Milliseconds, >= 0
    pub avg_latency_ms: f64,
    /// Fraction in [0, 1]
    pub error_rate: f64,
    pub request_count: Option<u64>,
}

impl ServiceNode {
    fn from_raw(index: usize, raw: RawServiceNode) -> Result<Self, GraphError> {
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or(GraphError::MissingNodeId { index })?;

        Ok(Self {
            service_name: raw
                .service_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| id.clone()),
            endpoint: raw.endpoint.filter(|s| !s.is_empty()),
            method: raw.method.filter(|s| !s.is_empty()),
            node_type: parse_or_default(raw.node_type.as_deref()),
            health: parse_or_default(raw.health.as_deref()),
            avg_latency_ms: sanitize_latency(raw.avg_latency),
            error_rate: sanitize_rate(raw.error_rate),
            request_count: raw.request_count,
            id,
        })
    }
}

/// Metrics attached to a call edge
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetrics {
    pub avg_latency_ms: f64,
    pub error_rate: f64,
    pub request_count: Option<u64>,
    pub p95_latency_ms: Option<f64>,
    pub timeout_count: Option<u64>,
}

impl From<RawEdgeMetrics> for EdgeMetrics {
    fn from(raw: RawEdgeMetrics) -> Self {
        Self {
            avg_latency_ms: sanitize_latency(raw.avg_latency),
            error_rate: sanitize_rate(raw.error_rate),
            request_count: raw.request_count,
            p95_latency_ms: raw.p95_latency.map(|v| sanitize_latency(Some(v))),
            timeout_count: raw.timeout_count,
        }
    }
}

/// A call from one service node to another
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEdge {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub metrics: EdgeMetrics,
    pub status: EdgeStatus,
    pub protocol: Option<String>,
}

impl CallEdge {
    fn from_raw(index: usize, raw: RawCallEdge) -> Result<Self, GraphError> {
        let source = raw
            .source_node_id
            .filter(|s| !s.is_empty())
            .ok_or(GraphError::MissingEndpoint {
                index,
                end: "source",
            })?;
        let target = raw
            .target_node_id
            .filter(|s| !s.is_empty())
            .ok_or(GraphError::MissingEndpoint {
                index,
                end: "target",
            })?;

        Ok(Self {
            // Backend convention for edge ids
            id: raw
                .id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("{source}->{target}")),
            source_node_id: source,
            target_node_id: target,
            metrics: raw.metrics.map(EdgeMetrics::from).unwrap_or_default(),
            status: parse_or_default(raw.status.as_deref()),
            protocol: raw.protocol.filter(|s| !s.is_empty()),
        })
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_node_id == self.target_node_id
    }
}

// =============================================================================
// FLOW GRAPH
// =============================================================================

/// Trace-level metadata carried alongside the graph when the backend sends it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMeta {
    pub trace_id: Option<String>,
    pub root_service: Option<String>,
    pub root_endpoint: Option<String>,
    pub status: Option<FlowStatus>,
    pub span_count: Option<u32>,
}

/// Nodes and edges of one trace.
///
/// May contain cycles and disconnected components. Node order is the
/// backend's order and is significant for layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowGraph {
    meta: FlowMeta,
    nodes: Vec<ServiceNode>,
    edges: Vec<CallEdge>,
    node_index: HashMap<String, usize>,
    edge_index: HashMap<String, usize>,
}

impl FlowGraph {
    /// Normalise a backend payload.
    ///
    /// Fails when `nodes` or `edges` is missing, on duplicate ids, and when an
    /// edge references a node that is not in the payload. Empty arrays are a
    /// valid (empty) graph.
    pub fn from_raw(raw: RawFlowGraph) -> Result<Self, GraphError> {
        let raw_nodes = raw.nodes.ok_or(GraphError::MissingArray("nodes"))?;
        let raw_edges = raw.edges.ok_or(GraphError::MissingArray("edges"))?;

        let nodes = raw_nodes
            .into_iter()
            .enumerate()
            .map(|(i, n)| ServiceNode::from_raw(i, n))
            .collect::<Result<Vec<_>, _>>()?;
        let edges = raw_edges
            .into_iter()
            .enumerate()
            .map(|(i, e)| CallEdge::from_raw(i, e))
            .collect::<Result<Vec<_>, _>>()?;

        let meta = FlowMeta {
            trace_id: raw.trace_id,
            root_service: raw.root_service,
            root_endpoint: raw.root_endpoint,
            status: raw.status.as_deref().and_then(|s| s.parse().ok()),
            span_count: raw.span_count,
        };

        let graph = Self::new(nodes, edges)?.with_meta(meta);
        tracing::debug!(
            trace_id = graph.meta.trace_id.as_deref().unwrap_or("-"),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "built flow graph"
        );
        Ok(graph)
    }

    /// Assemble a graph from already-normalised records, enforcing id
    /// uniqueness and edge endpoint integrity.
    pub fn new(nodes: Vec<ServiceNode>, edges: Vec<CallEdge>) -> Result<Self, GraphError> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if node_index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut edge_index = HashMap::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            for endpoint in [&edge.source_node_id, &edge.target_node_id] {
                if !node_index.contains_key(endpoint) {
                    return Err(GraphError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
            if edge_index.insert(edge.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateEdge(edge.id.clone()));
            }
        }

        Ok(Self {
            meta: FlowMeta::default(),
            nodes,
            edges,
            node_index,
            edge_index,
        })
    }

    pub fn with_meta(mut self, meta: FlowMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn meta(&self) -> &FlowMeta {
        &self.meta
    }

    /// Nodes in backend order
    pub fn nodes(&self) -> &[ServiceNode] {
        &self.nodes
    }

    /// Edges in backend order
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&ServiceNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edge(&self, id: &str) -> Option<&CallEdge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_index.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Distinct service names, first-seen order
    pub fn service_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .map(|n| n.service_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn parse_or_default<T>(value: Option<&str>) -> T
where
    T: FromStr<Err = std::convert::Infallible> + Default,
{
    value.and_then(|s| s.parse().ok()).unwrap_or_default()
}

fn sanitize_latency(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn sanitize_rate(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => 0.0,
    }
}
