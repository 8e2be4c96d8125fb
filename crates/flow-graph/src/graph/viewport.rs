//! Viewport - world/screen transform with fit-to-content
//!
//! Screen = world * zoom + pan. Fit centres the content bounds in the screen
//! rect with padding, clamping zoom so tiny graphs are not blown up and huge
//! ones stay legible.

use egui::{Pos2, Rect, Vec2};

/// Padding around fitted content, as a fraction of content size
pub const FIT_PADDING: f32 = 0.2;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 2.0;

/// Pan/zoom state for one canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    /// Screen offset of the world origin
    pub pan: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    pub fn rect_to_screen(&self, world: Rect) -> Rect {
        Rect::from_min_max(self.world_to_screen(world.min), self.world_to_screen(world.max))
    }

    /// Fit `content` (world) into `screen`. Empty or degenerate content keeps
    /// zoom 1 and centres the world origin.
    pub fn fit(content: Option<Rect>, screen: Rect) -> Self {
        let Some(content) = content.filter(|c| c.is_positive()) else {
            return Self {
                zoom: 1.0,
                pan: screen.center().to_vec2(),
            };
        };

        let zoom_x = screen.width() / (content.width() * (1.0 + FIT_PADDING));
        let zoom_y = screen.height() / (content.height() * (1.0 + FIT_PADDING));
        let zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);

        let pan = screen.center().to_vec2() - content.center().to_vec2() * zoom;
        Self { zoom, pan }
    }

    /// Zoom by `factor` keeping the world point under `anchor` (screen) fixed
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let world = self.screen_to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor.to_vec2() - world.to_vec2() * self.zoom;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }
}
