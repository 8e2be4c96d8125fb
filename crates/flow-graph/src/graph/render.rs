//! Render model - what the drawing surface consumes
//!
//! Nodes carry their position and every classified display value; edges
//! reference their endpoints by node id. A surface only draws, it never
//! classifies or positions.

use egui::{Pos2, Rect, Vec2};
use serde::Serialize;

use super::classify::{self, EdgeCategory, MetricClass};
use super::colors::StatusColor;
use super::layout::{node_size, FlowLayout};
use super::model::{EdgeStatus, FlowGraph, NodeHealth, NodeType};

/// A positioned, classified node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: String,
    /// Top-left of the node box, world units
    pub position: Pos2,
    pub size: Vec2,
    pub level: u32,
    pub label: String,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub node_type: NodeType,
    pub icon: &'static str,
    pub health: NodeHealth,
    pub health_color: StatusColor,
    pub latency_label: String,
    pub latency_class: MetricClass,
    pub error_rate_label: String,
    pub error_rate_class: MetricClass,
    pub request_count: Option<u64>,
    pub selected: bool,
}

impl RenderNode {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    /// Where incoming edges attach
    pub fn left_center(&self) -> Pos2 {
        Pos2::new(self.position.x, self.position.y + self.size.y / 2.0)
    }

    /// Where outgoing edges leave
    pub fn right_center(&self) -> Pos2 {
        Pos2::new(
            self.position.x + self.size.x,
            self.position.y + self.size.y / 2.0,
        )
    }
}

/// A classified edge, endpoints by node id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub status: EdgeStatus,
    pub category: EdgeCategory,
    pub color: StatusColor,
    pub animated: bool,
    pub latency_label: String,
    /// Only present when the edge has errors
    pub error_rate_label: Option<String>,
    pub error_label_color: Option<StatusColor>,
    pub protocol: Option<String>,
    pub selected: bool,
}

impl RenderEdge {
    /// Text shown at the edge midpoint
    pub fn label(&self) -> String {
        match &self.error_rate_label {
            Some(err) => format!("{} | {}", self.latency_label, err),
            None => self.latency_label.clone(),
        }
    }
}

/// Everything a surface needs to draw one flow graph
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowView {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl FlowView {
    /// Classify and position a graph, threading the selection flags through
    pub fn build(
        graph: &FlowGraph,
        layout: &FlowLayout,
        selected_node: Option<&str>,
        selected_edge: Option<&str>,
    ) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| {
                let entry = layout.get(&node.id);
                RenderNode {
                    id: node.id.clone(),
                    position: entry.map(|e| e.position).unwrap_or(Pos2::ZERO),
                    size: node_size(),
                    level: entry.map(|e| e.level).unwrap_or(0),
                    label: node.service_name.clone(),
                    endpoint: node.endpoint.clone(),
                    method: node.method.clone(),
                    node_type: node.node_type,
                    icon: node.node_type.icon(),
                    health: node.health,
                    health_color: classify::node_health_color(node.health),
                    latency_label: classify::format_latency(node.avg_latency_ms),
                    latency_class: classify::latency_class(node.avg_latency_ms),
                    error_rate_label: classify::format_error_rate(node.error_rate),
                    error_rate_class: classify::error_rate_class(node.error_rate),
                    request_count: node.request_count,
                    selected: selected_node == Some(node.id.as_str()),
                }
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .map(|edge| {
                let error_rate = edge.metrics.error_rate;
                let error_label_color = classify::error_label_color(error_rate);
                RenderEdge {
                    id: edge.id.clone(),
                    source: edge.source_node_id.clone(),
                    target: edge.target_node_id.clone(),
                    status: edge.status,
                    category: classify::edge_category(edge.status),
                    color: classify::edge_status_color(edge.status),
                    animated: classify::edge_animated(edge.status),
                    latency_label: classify::format_latency(edge.metrics.avg_latency_ms),
                    error_rate_label: error_label_color
                        .map(|_| classify::format_error_rate(error_rate)),
                    error_label_color,
                    protocol: edge.protocol.clone(),
                    selected: selected_edge == Some(edge.id.as_str()),
                }
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Segment from the source's right side to the target's left side
    pub fn edge_endpoints(&self, edge: &RenderEdge) -> Option<(Pos2, Pos2)> {
        let source = self.node(&edge.source)?;
        let target = self.node(&edge.target)?;
        Some((source.right_center(), target.left_center()))
    }

    /// Label anchor at the segment midpoint
    pub fn label_anchor(&self, edge: &RenderEdge) -> Option<Pos2> {
        self.edge_endpoints(edge).map(|(a, b)| a.lerp(b, 0.5))
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(RenderNode::rect)
            .reduce(|acc, r| acc.union(r))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::layout::{LayoutEngine, H_SPACING, NODE_HEIGHT, NODE_WIDTH, Y_OFFSET};
    use crate::graph::model::{CallEdge, EdgeMetrics, ServiceNode};

    fn service(id: &str, latency: f64, health: NodeHealth) -> ServiceNode {
        ServiceNode {
            id: id.into(),
            service_name: format!("{id}-svc"),
            endpoint: Some("/api".into()),
            method: Some("GET".into()),
            node_type: NodeType::Database,
            health,
            avg_latency_ms: latency,
            error_rate: 0.0,
            request_count: Some(3),
        }
    }

    fn call(from: &str, to: &str, status: EdgeStatus, error_rate: f64) -> CallEdge {
        CallEdge {
            id: format!("{from}->{to}"),
            source_node_id: from.into(),
            target_node_id: to.into(),
            metrics: EdgeMetrics {
                avg_latency_ms: 1530.0,
                error_rate,
                ..Default::default()
            },
            status,
            protocol: Some("HTTP".into()),
        }
    }

    fn view(selected_node: Option<&str>, selected_edge: Option<&str>) -> FlowView {
        let graph = FlowGraph::new(
            vec![
                service("a", 120.4, NodeHealth::Healthy),
                service("b", 2400.0, NodeHealth::Failing),
            ],
            vec![call("a", "b", EdgeStatus::Slow, 0.08)],
        )
        .unwrap();
        let layout = LayoutEngine::new().compute_layout(&graph);
        FlowView::build(&graph, &layout, selected_node, selected_edge)
    }

    #[test]
    fn test_nodes_are_classified() {
        let v = view(None, None);
        let a = v.node("a").unwrap();
        assert_eq!(a.latency_label, "120ms");
        assert_eq!(a.latency_class, MetricClass::Good);
        assert_eq!(a.health_color, StatusColor::Green);
        assert_eq!(a.icon, NodeType::Database.icon());

        let b = v.node("b").unwrap();
        assert_eq!(b.latency_label, "2.4s");
        assert_eq!(b.latency_class, MetricClass::Bad);
        assert_eq!(b.health_color, StatusColor::Red);
        assert_eq!(b.level, 1);
    }

    #[test]
    fn test_edges_are_classified() {
        let v = view(None, None);
        let e = v.edge("a->b").unwrap();
        assert_eq!(e.category, EdgeCategory::Slow);
        assert_eq!(e.color, StatusColor::Amber);
        assert!(e.animated);
        assert_eq!(e.error_rate_label.as_deref(), Some("8.0%"));
        assert_eq!(e.error_label_color, Some(StatusColor::Red));
        assert_eq!(e.label(), "1.5s | 8.0%");
    }

    #[test]
    fn test_selection_flags() {
        let v = view(Some("b"), Some("a->b"));
        assert!(!v.node("a").unwrap().selected);
        assert!(v.node("b").unwrap().selected);
        assert!(v.edge("a->b").unwrap().selected);

        let v = view(Some("missing"), None);
        assert!(v.nodes.iter().all(|n| !n.selected));
    }

    #[test]
    fn test_edge_geometry() {
        let v = view(None, None);
        let e = v.edge("a->b").unwrap();
        let (from, to) = v.edge_endpoints(e).unwrap();
        assert_eq!(from, Pos2::new(NODE_WIDTH, Y_OFFSET + NODE_HEIGHT / 2.0));
        assert_eq!(to, Pos2::new(H_SPACING, Y_OFFSET + NODE_HEIGHT / 2.0));
        assert_eq!(
            v.label_anchor(e).unwrap(),
            Pos2::new((NODE_WIDTH + H_SPACING) / 2.0, Y_OFFSET + NODE_HEIGHT / 2.0)
        );
    }

    #[test]
    fn test_view_serializes_for_surfaces() {
        let json = serde_json::to_value(view(None, None)).unwrap();
        assert_eq!(json["nodes"][0]["healthColor"], "green");
        assert_eq!(json["edges"][0]["category"], "slow");
        assert_eq!(json["edges"][0]["animated"], true);
    }
}
