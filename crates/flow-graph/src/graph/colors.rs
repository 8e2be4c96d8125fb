//! Color palette for the flow visualization
//!
//! One status table shared by node health, edge status and metric labels,
//! plus the fixed chrome colors the painter uses.

use egui::Color32;
use serde::Serialize;

// =============================================================================
// STATUS PALETTE
// =============================================================================

/// Discrete status color. Every classifier maps into this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Green,
    Amber,
    Red,
    DarkRed,
}

impl StatusColor {
    pub fn color32(&self) -> Color32 {
        match self {
            StatusColor::Green => Color32::from_rgb(16, 185, 129), // #10b981
            StatusColor::Amber => Color32::from_rgb(245, 158, 11), // #f59e0b
            StatusColor::Red => Color32::from_rgb(239, 68, 68),    // #ef4444
            StatusColor::DarkRed => Color32::from_rgb(220, 38, 38), // #dc2626
        }
    }

    /// CSS-style hex, for text output and JSON consumers
    pub fn hex(&self) -> &'static str {
        match self {
            StatusColor::Green => "#10b981",
            StatusColor::Amber => "#f59e0b",
            StatusColor::Red => "#ef4444",
            StatusColor::DarkRed => "#dc2626",
        }
    }

    /// Translucent variant for node fills and glows
    pub fn faded(&self, alpha: u8) -> Color32 {
        let c = self.color32();
        Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha)
    }
}

// =============================================================================
// CHROME
// =============================================================================

/// Canvas background
pub const BACKGROUND: Color32 = Color32::from_rgb(15, 23, 42); // slate-900

/// Node body fill
pub const NODE_FILL: Color32 = Color32::from_rgb(30, 41, 59); // slate-800

/// Primary label text
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(226, 232, 240); // slate-200

/// Secondary label text (endpoint, method)
pub const TEXT_MUTED: Color32 = Color32::from_rgb(148, 163, 184); // slate-400

/// Selection outline for nodes and edges
pub const SELECTED_OUTLINE: Color32 = Color32::from_rgb(96, 165, 250); // blue-400

/// Loading overlay tint over a stale graph
pub const LOADING_OVERLAY: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 96);
