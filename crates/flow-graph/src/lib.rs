//! Trace Flow Graph Engine
//!
//! This crate contains ONLY the graph engine - no API client, no app state.
//! The engine is driven by flow-ui which owns the fetch lifecycle and
//! selection state.

pub mod graph;

pub use graph::{
    // Classification
    classify,
    colors::StatusColor,
    // Core graph types
    CallEdge,
    EdgeMetrics,
    EdgeStatus,
    FlowGraph,
    FlowLayout,
    FlowMeta,
    FlowScene,
    FlowView,
    GraphError,
    HitTarget,
    LayoutEngine,
    LayoutEntry,
    NodeHealth,
    NodeType,
    // Drawing
    paint_flow,
    paint_loading_overlay,
    RenderEdge,
    RenderNode,
    ServiceNode,
    SpatialIndex,
    ViewTransform,
};
