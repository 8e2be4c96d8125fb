//! Trace Flow Graph Module
//!
//! Turns one trace's service call graph into positioned, classified render
//! data.
//!
//! # Architecture
//!
//! ```text
//! RawFlowGraph (from backend)
//!        │
//!        ▼
//! FlowGraph::from_raw (normalise, validate edge endpoints)
//!        │
//!        ▼
//! LayoutEngine (roots → BFS levels → columns)
//!        │
//!        ▼
//! FlowScene (graph + layout, immutable per fetch)
//!        │
//!        ├──► FlowView (classified nodes/edges + selection flags)
//!        │         │
//!        │         ├──► paint_flow (draws to egui::Painter)
//!        │         └──► SpatialIndex (click → node/edge)
//!        │
//!        └──► ViewTransform (fit view, pan/zoom)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let scene = FlowScene::from_raw(raw)?;
//! let view = scene.view(selected_node, selected_edge);
//! let transform = ViewTransform::fit(view.bounds(), screen_rect);
//! paint_flow(&painter, &view, &transform);
//! ```

pub mod classify;
pub mod colors;
pub mod error;
pub mod layout;
pub mod model;
pub mod paint;
pub mod render;
pub mod spatial;
pub mod viewport;

pub use error::GraphError;
pub use layout::{FlowLayout, LayoutEngine, LayoutEntry};
pub use model::*;
pub use paint::{paint_flow, paint_loading_overlay};
pub use render::{FlowView, RenderEdge, RenderNode};
pub use spatial::{HitTarget, SpatialIndex};
pub use viewport::ViewTransform;

use flow_types::RawFlowGraph;

// =============================================================================
// SCENE
// =============================================================================

/// A built graph together with its layout.
///
/// Created fresh for every flow fetch and never mutated afterwards; selection
/// is applied when producing a [`FlowView`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlowScene {
    graph: FlowGraph,
    layout: FlowLayout,
}

impl FlowScene {
    /// Lay out an already-built graph
    pub fn new(graph: FlowGraph) -> Self {
        let layout = LayoutEngine::new().compute_layout(&graph);
        Self { graph, layout }
    }

    /// Build, validate and lay out a backend payload
    pub fn from_raw(raw: RawFlowGraph) -> Result<Self, GraphError> {
        FlowGraph::from_raw(raw).map(Self::new)
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn layout(&self) -> &FlowLayout {
        &self.layout
    }

    /// Render data with the given node/edge highlighted
    pub fn view(&self, selected_node: Option<&str>, selected_edge: Option<&str>) -> FlowView {
        FlowView::build(&self.graph, &self.layout, selected_node, selected_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_types::{RawCallEdge, RawServiceNode};

    fn node(id: &str) -> RawServiceNode {
        RawServiceNode {
            id: Some(id.to_string()),
            service_name: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn edge(from: &str, to: &str) -> RawCallEdge {
        RawCallEdge {
            source_node_id: Some(from.to_string()),
            target_node_id: Some(to.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_scene_from_raw() {
        let raw = RawFlowGraph {
            nodes: Some(vec![node("gateway"), node("orders"), node("db")]),
            edges: Some(vec![edge("gateway", "orders"), edge("orders", "db")]),
            ..Default::default()
        };
        let scene = FlowScene::from_raw(raw).unwrap();
        assert_eq!(scene.layout().level_of("db"), Some(2));

        let view = scene.view(Some("orders"), None);
        assert!(view.node("orders").unwrap().selected);
        assert!(!view.node("db").unwrap().selected);
    }

    #[test]
    fn test_scene_rejects_missing_edges() {
        let raw = RawFlowGraph {
            nodes: Some(vec![node("a")]),
            edges: None,
            ..Default::default()
        };
        assert_eq!(
            FlowScene::from_raw(raw).unwrap_err(),
            GraphError::MissingArray("edges")
        );
    }
}
