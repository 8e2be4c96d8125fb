//! Painting - draws a FlowView using egui::Painter
//!
//! Edges first, then node boxes on top. Everything is given in world
//! coordinates and mapped through the view transform.

use egui::{Align2, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use super::colors::{self, StatusColor};
use super::render::{FlowView, RenderEdge, RenderNode};
use super::viewport::ViewTransform;

const CORNER_RADIUS: f32 = 8.0;
const EDGE_WIDTH: f32 = 2.0;
const SELECTED_EDGE_WIDTH: f32 = 3.5;
const ARROW_SIZE: f32 = 10.0;
const DASH_LENGTH: f32 = 8.0;
const GAP_LENGTH: f32 = 5.0;

/// Below this zoom, labels are unreadable and skipped
const LABEL_MIN_ZOOM: f32 = 0.4;

/// Draw the whole flow graph
pub fn paint_flow(painter: &Painter, view: &FlowView, transform: &ViewTransform) {
    for edge in &view.edges {
        if let Some((from, to)) = view.edge_endpoints(edge) {
            paint_edge(painter, edge, from, to, view, transform);
        }
    }
    for node in &view.nodes {
        paint_node(painter, node, transform);
    }
}

/// Dim a stale graph while its replacement loads
pub fn paint_loading_overlay(painter: &Painter, screen: Rect) {
    painter.rect_filled(screen, 0.0, colors::LOADING_OVERLAY);
    painter.text(
        screen.center(),
        Align2::CENTER_CENTER,
        "Loading…",
        FontId::proportional(16.0),
        colors::TEXT_PRIMARY,
    );
}

fn paint_edge(
    painter: &Painter,
    edge: &RenderEdge,
    from: Pos2,
    to: Pos2,
    view: &FlowView,
    transform: &ViewTransform,
) {
    let zoom = transform.zoom;
    let a = transform.world_to_screen(from);
    let b = transform.world_to_screen(to);
    let color = edge.color.color32();

    let width = if edge.selected {
        SELECTED_EDGE_WIDTH
    } else {
        EDGE_WIDTH
    } * zoom;

    if edge.selected {
        painter.line_segment(
            [a, b],
            Stroke::new(width + 3.0 * zoom, colors::SELECTED_OUTLINE),
        );
    }

    let stroke = Stroke::new(width, color);
    if edge.animated {
        painter.extend(Shape::dashed_line(
            &[a, b],
            stroke,
            DASH_LENGTH * zoom,
            GAP_LENGTH * zoom,
        ));
    } else {
        painter.line_segment([a, b], stroke);
    }

    // Arrow head at the target
    let dir = (b - a).normalized();
    if dir != Vec2::ZERO && dir.is_finite() {
        let size = ARROW_SIZE * zoom;
        let back = b - dir * size;
        let side = dir.rot90() * size * 0.5;
        painter.add(Shape::convex_polygon(
            vec![b, back + side, back - side],
            color,
            Stroke::NONE,
        ));
    }

    if zoom < LABEL_MIN_ZOOM {
        return;
    }
    let Some(anchor) = view.label_anchor(edge) else {
        return;
    };
    let anchor = transform.world_to_screen(anchor);
    let font = FontId::proportional(11.0 * zoom);

    let latency_rect = painter.text(
        anchor - Vec2::new(0.0, 8.0 * zoom),
        Align2::CENTER_BOTTOM,
        &edge.latency_label,
        font.clone(),
        colors::TEXT_MUTED,
    );
    if let (Some(label), Some(err_color)) = (&edge.error_rate_label, edge.error_label_color) {
        painter.text(
            Pos2::new(latency_rect.right() + 4.0 * zoom, latency_rect.bottom()),
            Align2::LEFT_BOTTOM,
            label,
            font,
            err_color.color32(),
        );
    }
}

fn paint_node(painter: &Painter, node: &RenderNode, transform: &ViewTransform) {
    let zoom = transform.zoom;
    let rect = transform.rect_to_screen(node.rect());
    let rounding = CORNER_RADIUS * zoom;
    let health = node.health_color;

    if node.selected {
        painter.rect_stroke(
            rect.expand(4.0 * zoom),
            rounding + 4.0 * zoom,
            Stroke::new(2.0 * zoom, colors::SELECTED_OUTLINE),
        );
    }

    painter.rect(
        rect,
        rounding,
        colors::NODE_FILL,
        Stroke::new(2.0 * zoom, health.color32()),
    );

    // Health stripe along the left side
    let stripe = Rect::from_min_size(rect.min, Vec2::new(4.0 * zoom, rect.height()));
    painter.rect_filled(stripe, rounding.min(2.0), health.faded(200));

    if zoom < LABEL_MIN_ZOOM {
        return;
    }

    let pad = 10.0 * zoom;
    let mut cursor = rect.min + Vec2::splat(pad);

    let title = painter.text(
        cursor,
        Align2::LEFT_TOP,
        format!("{} {}", node.icon, node.label),
        FontId::proportional(13.0 * zoom),
        colors::TEXT_PRIMARY,
    );
    cursor.y = title.bottom() + 2.0 * zoom;

    let route = match (&node.method, &node.endpoint) {
        (Some(m), Some(e)) => Some(format!("{m} {e}")),
        (None, Some(e)) => Some(e.clone()),
        (Some(m), None) => Some(m.clone()),
        (None, None) => None,
    };
    if let Some(route) = route {
        let r = painter.text(
            cursor,
            Align2::LEFT_TOP,
            route,
            FontId::monospace(10.0 * zoom),
            colors::TEXT_MUTED,
        );
        cursor.y = r.bottom() + 4.0 * zoom;
    }

    let latency = painter.text(
        cursor,
        Align2::LEFT_TOP,
        &node.latency_label,
        FontId::proportional(11.0 * zoom),
        node.latency_class.color().color32(),
    );
    painter.text(
        Pos2::new(latency.right() + 8.0 * zoom, cursor.y),
        Align2::LEFT_TOP,
        &node.error_rate_label,
        FontId::proportional(11.0 * zoom),
        node.error_rate_class.color().color32(),
    );

    if let Some(count) = node.request_count {
        painter.text(
            Pos2::new(rect.right() - pad, rect.bottom() - pad),
            Align2::RIGHT_BOTTOM,
            format!("{count} req"),
            FontId::proportional(10.0 * zoom),
            StatusColor::Green.faded(160),
        );
    }
}
