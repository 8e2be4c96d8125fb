//! Spatial Index for click hit testing
//!
//! R-tree (via `rstar`) over node boxes and edge segments, in world
//! coordinates. A click resolves to a node when one is in range, otherwise to
//! the nearest edge, otherwise to nothing (the pane).

use egui::Pos2;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::render::FlowView;

/// What a click landed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    Node(String),
    Edge(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Node,
    Edge,
}

#[derive(Debug, Clone)]
enum Shape {
    Box { min: [f32; 2], max: [f32; 2] },
    Segment { from: [f32; 2], to: [f32; 2] },
}

/// One indexed element
#[derive(Debug, Clone)]
struct SpatialEntry {
    id: String,
    kind: EntryKind,
    shape: Shape,
    envelope: AABB<[f32; 2]>,
}

impl SpatialEntry {
    fn node(id: &str, min: Pos2, max: Pos2) -> Self {
        let (min, max) = ([min.x, min.y], [max.x, max.y]);
        Self {
            id: id.to_string(),
            kind: EntryKind::Node,
            shape: Shape::Box { min, max },
            envelope: AABB::from_corners(min, max),
        }
    }

    fn edge(id: &str, from: Pos2, to: Pos2) -> Self {
        let (from, to) = ([from.x, from.y], [to.x, to.y]);
        Self {
            id: id.to_string(),
            kind: EntryKind::Edge,
            shape: Shape::Segment { from, to },
            envelope: AABB::from_corners(from, to),
        }
    }
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for SpatialEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        match &self.shape {
            Shape::Box { min, max } => {
                let dx = (min[0] - point[0]).max(point[0] - max[0]).max(0.0);
                let dy = (min[1] - point[1]).max(point[1] - max[1]).max(0.0);
                dx * dx + dy * dy
            }
            Shape::Segment { from, to } => {
                let (vx, vy) = (to[0] - from[0], to[1] - from[1]);
                let len_2 = vx * vx + vy * vy;
                let t = if len_2 > 0.0 {
                    (((point[0] - from[0]) * vx + (point[1] - from[1]) * vy) / len_2)
                        .clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = point[0] - (from[0] + t * vx);
                let dy = point[1] - (from[1] + t * vy);
                dx * dx + dy * dy
            }
        }
    }
}

/// Hit-test index built from one [`FlowView`]
#[derive(Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
    count: usize,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    pub fn from_view(view: &FlowView) -> Self {
        let mut entries: Vec<SpatialEntry> = view
            .nodes
            .iter()
            .map(|n| {
                let rect = n.rect();
                SpatialEntry::node(&n.id, rect.min, rect.max)
            })
            .collect();
        entries.extend(view.edges.iter().filter_map(|e| {
            view.edge_endpoints(e)
                .map(|(from, to)| SpatialEntry::edge(&e.id, from, to))
        }));

        let count = entries.len();
        Self {
            tree: RTree::bulk_load(entries),
            count,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Resolve a world-space point. `threshold` is the pick radius in world
    /// units; nodes take precedence over edges.
    pub fn hit_test(&self, world: Pos2, threshold: f32) -> Option<HitTarget> {
        let point = [world.x, world.y];
        let search = AABB::from_corners(
            [point[0] - threshold, point[1] - threshold],
            [point[0] + threshold, point[1] + threshold],
        );
        let max_2 = threshold * threshold;

        let closest = |kind: EntryKind| {
            self.tree
                .locate_in_envelope_intersecting(&search)
                .filter(|e| e.kind == kind)
                .map(|e| (e, e.distance_2(&point)))
                .filter(|(_, d)| *d <= max_2)
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(e, _)| e.id.clone())
        };

        closest(EntryKind::Node)
            .map(HitTarget::Node)
            .or_else(|| closest(EntryKind::Edge).map(HitTarget::Edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::layout::{LayoutEngine, H_SPACING, NODE_HEIGHT, NODE_WIDTH, Y_OFFSET};
    use crate::graph::model::{CallEdge, FlowGraph, ServiceNode};
    use crate::graph::{EdgeMetrics, EdgeStatus, NodeHealth, NodeType};

    fn node(id: &str) -> ServiceNode {
        ServiceNode {
            id: id.into(),
            service_name: id.into(),
            endpoint: None,
            method: None,
            node_type: NodeType::Unspecified,
            health: NodeHealth::Healthy,
            avg_latency_ms: 0.0,
            error_rate: 0.0,
            request_count: None,
        }
    }

    fn index() -> SpatialIndex {
        let graph = FlowGraph::new(
            vec![node("a"), node("b")],
            vec![CallEdge {
                id: "a->b".into(),
                source_node_id: "a".into(),
                target_node_id: "b".into(),
                metrics: EdgeMetrics::default(),
                status: EdgeStatus::Normal,
                protocol: None,
            }],
        )
        .unwrap();
        let layout = LayoutEngine::new().compute_layout(&graph);
        SpatialIndex::from_view(&FlowView::build(&graph, &layout, None, None))
    }

    #[test]
    fn test_hit_node_box() {
        let idx = index();
        assert_eq!(idx.len(), 3);
        let inside_a = Pos2::new(10.0, Y_OFFSET + 10.0);
        assert_eq!(idx.hit_test(inside_a, 4.0), Some(HitTarget::Node("a".into())));
        let inside_b = Pos2::new(H_SPACING + NODE_WIDTH - 1.0, Y_OFFSET + NODE_HEIGHT - 1.0);
        assert_eq!(idx.hit_test(inside_b, 4.0), Some(HitTarget::Node("b".into())));
    }

    #[test]
    fn test_hit_edge_between_nodes() {
        let idx = index();
        let mid_y = Y_OFFSET + NODE_HEIGHT / 2.0;
        let gap_x = (NODE_WIDTH + H_SPACING) / 2.0;
        assert_eq!(
            idx.hit_test(Pos2::new(gap_x, mid_y + 3.0), 6.0),
            Some(HitTarget::Edge("a->b".into()))
        );
    }

    #[test]
    fn test_miss_is_pane() {
        let idx = index();
        assert_eq!(idx.hit_test(Pos2::new(-500.0, -500.0), 6.0), None);
        let gap_x = (NODE_WIDTH + H_SPACING) / 2.0;
        assert_eq!(idx.hit_test(Pos2::new(gap_x, Y_OFFSET - 50.0), 6.0), None);
    }

    #[test]
    fn test_empty_view() {
        let idx = SpatialIndex::from_view(&FlowView::default());
        assert!(idx.is_empty());
        assert_eq!(idx.hit_test(Pos2::ZERO, 10.0), None);
    }
}
