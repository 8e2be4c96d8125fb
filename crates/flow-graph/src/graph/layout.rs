//! Layout algorithm - breadth-first levels laid out as columns
//!
//! Nodes with no incoming call are roots at level 0. Levels are assigned by a
//! single BFS from all roots at once; each level becomes a column, centred
//! vertically on a fixed baseline. No force relaxation: the result is a pure
//! function of node order and edge set.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use egui::{Pos2, Rect, Vec2};
use serde::Serialize;

use super::model::FlowGraph;

// =============================================================================
// LAYOUT CONSTANTS
// =============================================================================

/// Distance between level columns
pub const H_SPACING: f32 = 250.0;
/// Distance between nodes in one column
pub const V_SPACING: f32 = 120.0;
/// Baseline each column is centred on
pub const Y_OFFSET: f32 = 200.0;

/// Node box size (the renderer draws boxes from the layout position)
pub const NODE_WIDTH: f32 = 200.0;
pub const NODE_HEIGHT: f32 = 80.0;

pub fn node_size() -> Vec2 {
    Vec2::new(NODE_WIDTH, NODE_HEIGHT)
}

// =============================================================================
// LAYOUT RESULT
// =============================================================================

/// Level and position assigned to one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub node_id: String,
    pub level: u32,
    /// Top-left corner of the node box, world units
    pub position: Pos2,
}

/// Layout of a whole graph. Entries are kept in node input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowLayout {
    entries: Vec<LayoutEntry>,
    index: HashMap<String, usize>,
    roots: Vec<String>,
    used_fallback_root: bool,
}

impl FlowLayout {
    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn get(&self, node_id: &str) -> Option<&LayoutEntry> {
        self.index.get(node_id).map(|&i| &self.entries[i])
    }

    pub fn level_of(&self, node_id: &str) -> Option<u32> {
        self.get(node_id).map(|e| e.level)
    }

    pub fn position_of(&self, node_id: &str) -> Option<Pos2> {
        self.get(node_id).map(|e| e.position)
    }

    /// Roots the BFS started from
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// True when no node had zero in-degree and the first node was used
    pub fn used_fallback_root(&self) -> bool {
        self.used_fallback_root
    }

    /// Node ids grouped by level, input order within each level
    pub fn levels(&self) -> BTreeMap<u32, Vec<&str>> {
        let mut levels: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for entry in &self.entries {
            levels.entry(entry.level).or_default().push(&entry.node_id);
        }
        levels
    }

    pub fn max_level(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.level).max()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// World-space rectangle covering every node box
    pub fn bounds(&self) -> Option<Rect> {
        self.entries
            .iter()
            .map(|e| Rect::from_min_size(e.position, node_size()))
            .reduce(|acc, r| acc.union(r))
    }
}

// =============================================================================
// LAYOUT ENGINE
// =============================================================================

/// Layout engine
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine;

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Lay out a validated flow graph
    pub fn compute_layout(&self, graph: &FlowGraph) -> FlowLayout {
        let ids: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<(&str, &str)> = graph
            .edges()
            .iter()
            .map(|e| (e.source_node_id.as_str(), e.target_node_id.as_str()))
            .collect();
        self.layout_ids(&ids, &edges)
    }

    /// Lay out bare ids. Edges whose endpoints are not in `node_ids` are
    /// ignored; a repeated node id keeps its first position in the order.
    pub fn layout_ids(&self, node_ids: &[&str], edges: &[(&str, &str)]) -> FlowLayout {
        let mut seen = HashSet::with_capacity(node_ids.len());
        let order: Vec<&str> = node_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        if order.is_empty() {
            return FlowLayout::default();
        }

        // Adjacency, covering every node even without edges
        let mut children: HashMap<&str, Vec<&str>> =
            order.iter().map(|id| (*id, Vec::new())).collect();
        let mut parents: HashMap<&str, Vec<&str>> =
            order.iter().map(|id| (*id, Vec::new())).collect();
        for &(from, to) in edges {
            if !children.contains_key(from) || !children.contains_key(to) {
                continue;
            }
            if let Some(c) = children.get_mut(from) {
                c.push(to);
            }
            if let Some(p) = parents.get_mut(to) {
                p.push(from);
            }
        }

        let mut roots: Vec<&str> = order
            .iter()
            .copied()
            .filter(|id| parents.get(id).is_none_or(|p| p.is_empty()))
            .collect();
        let used_fallback_root = roots.is_empty();
        if used_fallback_root {
            roots.push(order[0]);
            tracing::debug!(root = order[0], "no zero in-degree node, using first node as root");
        }

        // BFS from all roots; first dequeue of a node fixes its level
        let mut levels: HashMap<&str, u32> = HashMap::with_capacity(order.len());
        let mut queue: VecDeque<(&str, u32)> = roots.iter().map(|r| (*r, 0)).collect();
        while let Some((id, level)) = queue.pop_front() {
            if levels.contains_key(id) {
                continue;
            }
            levels.insert(id, level);
            for &child in children.get(id).map(Vec::as_slice).unwrap_or_default() {
                if !levels.contains_key(child) {
                    queue.push_back((child, level + 1));
                }
            }
        }

        // Unreachable nodes sit in the first column
        let level_of = |id: &str| levels.get(id).copied().unwrap_or(0);

        let mut groups: BTreeMap<u32, Vec<&str>> = BTreeMap::new();
        for &id in &order {
            groups.entry(level_of(id)).or_default().push(id);
        }

        let mut positions: HashMap<&str, Pos2> = HashMap::with_capacity(order.len());
        for (&level, ids) in &groups {
            let n = ids.len() as f32;
            for (i, &id) in ids.iter().enumerate() {
                let x = level as f32 * H_SPACING;
                let y = (i as f32 - (n - 1.0) / 2.0) * V_SPACING + Y_OFFSET;
                positions.insert(id, Pos2::new(x, y));
            }
        }

        let entries: Vec<LayoutEntry> = order
            .iter()
            .map(|&id| LayoutEntry {
                node_id: id.to_string(),
                level: level_of(id),
                position: positions.get(id).copied().unwrap_or(Pos2::new(0.0, Y_OFFSET)),
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.node_id.clone(), i))
            .collect();

        tracing::debug!(
            nodes = entries.len(),
            roots = roots.len(),
            levels = groups.len(),
            "computed flow layout"
        );

        FlowLayout {
            entries,
            index,
            roots: roots.into_iter().map(str::to_string).collect(),
            used_fallback_root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout(ids: &[&str], edges: &[(&str, &str)]) -> FlowLayout {
        LayoutEngine::new().layout_ids(ids, edges)
    }

    #[test]
    fn test_fan_out_is_symmetric() {
        let l = layout(&["A", "B", "C"], &[("A", "B"), ("A", "C")]);
        assert_eq!(l.level_of("A"), Some(0));
        assert_eq!(l.level_of("B"), Some(1));
        assert_eq!(l.level_of("C"), Some(1));

        let a = l.position_of("A").unwrap();
        let b = l.position_of("B").unwrap();
        let c = l.position_of("C").unwrap();
        assert_eq!(a, Pos2::new(0.0, Y_OFFSET));
        assert_eq!(b, Pos2::new(H_SPACING, Y_OFFSET - 60.0));
        assert_eq!(c, Pos2::new(H_SPACING, Y_OFFSET + 60.0));
        assert_eq!(a.y - b.y, c.y - a.y);
    }

    #[test]
    fn test_empty_graph() {
        let l = layout(&[], &[]);
        assert!(l.is_empty());
        assert!(l.roots().is_empty());
        assert_eq!(l.bounds(), None);
        assert_eq!(l.max_level(), None);
    }

    #[test]
    fn test_single_node() {
        let l = layout(&["A"], &[]);
        assert_eq!(l.roots(), &["A".to_string()]);
        assert_eq!(l.position_of("A"), Some(Pos2::new(0.0, Y_OFFSET)));
        assert!(!l.used_fallback_root());
    }

    #[test]
    fn test_self_loop_falls_back_to_first_node() {
        let l = layout(&["A"], &[("A", "A")]);
        assert!(l.used_fallback_root());
        assert_eq!(l.roots(), &["A".to_string()]);
        assert_eq!(l.level_of("A"), Some(0));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_pure_cycle_terminates() {
        let l = layout(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
        assert!(l.used_fallback_root());
        assert_eq!(l.level_of("A"), Some(0));
        assert_eq!(l.level_of("B"), Some(1));
        assert_eq!(l.level_of("C"), Some(2));
    }

    #[test]
    fn test_disconnected_nodes_are_roots() {
        let l = layout(&["A", "B"], &[]);
        assert_eq!(l.roots(), &["A".to_string(), "B".to_string()]);
        assert_eq!(l.level_of("A"), Some(0));
        assert_eq!(l.level_of("B"), Some(0));
        assert_ne!(l.position_of("A"), l.position_of("B"));
    }

    #[test]
    fn test_unreachable_cycle_defaults_to_level_zero() {
        // R is a root; X<->Y has no zero in-degree node and is never reached
        let l = layout(&["R", "S", "X", "Y"], &[("R", "S"), ("X", "Y"), ("Y", "X")]);
        assert!(!l.used_fallback_root());
        assert_eq!(l.level_of("X"), Some(0));
        assert_eq!(l.level_of("Y"), Some(0));
        assert_eq!(l.levels()[&0], vec!["R", "X", "Y"]);
    }

    #[test]
    fn test_first_discovery_wins() {
        // D is reachable at depth 1 from R2 and depth 2 via R1 -> M
        let l = layout(
            &["R1", "R2", "M", "D"],
            &[("R1", "M"), ("M", "D"), ("R2", "D")],
        );
        assert_eq!(l.level_of("M"), Some(1));
        assert_eq!(l.level_of("D"), Some(1));
    }

    #[test]
    fn test_unknown_edge_endpoints_ignored() {
        let l = layout(&["A", "B"], &[("A", "ghost"), ("A", "B")]);
        assert_eq!(l.len(), 2);
        assert_eq!(l.level_of("B"), Some(1));
        assert_eq!(l.level_of("ghost"), None);
    }

    #[test]
    fn test_bounds_cover_node_boxes() {
        let l = layout(&["A", "B"], &[("A", "B")]);
        let bounds = l.bounds().unwrap();
        assert_eq!(bounds.min, Pos2::new(0.0, Y_OFFSET));
        assert_eq!(
            bounds.max,
            Pos2::new(H_SPACING + NODE_WIDTH, Y_OFFSET + NODE_HEIGHT)
        );
    }
}
