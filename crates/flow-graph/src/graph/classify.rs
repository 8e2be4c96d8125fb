//! Status classification - metric thresholds, edge categories, display text
//!
//! Pure functions over model values. The thresholds are fixed design
//! constants; comparisons are strict so a value exactly on a threshold stays
//! in the lower class.

use flow_types::FlowStatus;
use serde::Serialize;

use super::colors::StatusColor;
use super::model::{EdgeStatus, NodeHealth};

/// Latency above this is bad (ms)
pub const LATENCY_BAD_MS: f64 = 1000.0;
/// Latency above this is a warning (ms)
pub const LATENCY_WARNING_MS: f64 = 500.0;
/// Error rate above this is bad
pub const ERROR_RATE_BAD: f64 = 0.05;
/// Error rate above this is a warning
pub const ERROR_RATE_WARNING: f64 = 0.01;

// =============================================================================
// METRIC CLASSES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricClass {
    Good,
    Warning,
    Bad,
}

impl MetricClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricClass::Good => "good",
            MetricClass::Warning => "warning",
            MetricClass::Bad => "bad",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            MetricClass::Good => StatusColor::Green,
            MetricClass::Warning => StatusColor::Amber,
            MetricClass::Bad => StatusColor::Red,
        }
    }
}

pub fn latency_class(avg_latency_ms: f64) -> MetricClass {
    if avg_latency_ms > LATENCY_BAD_MS {
        MetricClass::Bad
    } else if avg_latency_ms > LATENCY_WARNING_MS {
        MetricClass::Warning
    } else {
        MetricClass::Good
    }
}

pub fn error_rate_class(error_rate: f64) -> MetricClass {
    if error_rate > ERROR_RATE_BAD {
        MetricClass::Bad
    } else if error_rate > ERROR_RATE_WARNING {
        MetricClass::Warning
    } else {
        MetricClass::Good
    }
}

// =============================================================================
// EDGE CATEGORY
// =============================================================================

/// Visual category of a call edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeCategory {
    #[default]
    Default,
    Slow,
    Failing,
}

impl EdgeCategory {
    /// Style class name; empty for the default category
    pub fn class_name(&self) -> &'static str {
        match self {
            EdgeCategory::Default => "",
            EdgeCategory::Slow => "slow",
            EdgeCategory::Failing => "failing",
        }
    }
}

pub fn edge_category(status: EdgeStatus) -> EdgeCategory {
    match status {
        EdgeStatus::Failing | EdgeStatus::Timeout => EdgeCategory::Failing,
        EdgeStatus::Slow => EdgeCategory::Slow,
        EdgeStatus::Normal | EdgeStatus::Retrying => EdgeCategory::Default,
    }
}

/// Edges pulse while slow or failing. TIMEOUT is drawn static.
pub fn edge_animated(status: EdgeStatus) -> bool {
    matches!(status, EdgeStatus::Slow | EdgeStatus::Failing)
}

// =============================================================================
// COLORS
// =============================================================================

pub fn node_health_color(health: NodeHealth) -> StatusColor {
    match health {
        NodeHealth::Failing => StatusColor::Red,
        NodeHealth::Degraded => StatusColor::Amber,
        NodeHealth::Healthy => StatusColor::Green,
    }
}

pub fn edge_status_color(status: EdgeStatus) -> StatusColor {
    match status {
        EdgeStatus::Failing => StatusColor::Red,
        EdgeStatus::Slow => StatusColor::Amber,
        EdgeStatus::Timeout => StatusColor::DarkRed,
        EdgeStatus::Normal | EdgeStatus::Retrying => StatusColor::Green,
    }
}

/// Color of the error-rate part of an edge label; `None` hides it
pub fn error_label_color(error_rate: f64) -> Option<StatusColor> {
    if error_rate > ERROR_RATE_BAD {
        Some(StatusColor::Red)
    } else if error_rate > 0.0 {
        Some(StatusColor::Amber)
    } else {
        None
    }
}

/// Trace list status badge
pub fn flow_status_color(status: FlowStatus) -> StatusColor {
    match status {
        FlowStatus::Failure => StatusColor::Red,
        FlowStatus::PartialFailure => StatusColor::Amber,
        _ => StatusColor::Green,
    }
}

// =============================================================================
// FORMATTING
// =============================================================================

/// `612.7` → `"612ms"`, `1530` → `"1.5s"`
pub fn format_latency(ms: f64) -> String {
    if ms < LATENCY_BAD_MS {
        format!("{}ms", ms.trunc() as i64)
    } else {
        format!("{:.1}s", ms / 1000.0)
    }
}

/// `0.0123` → `"1.2%"`
pub fn format_error_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_boundaries() {
        assert_eq!(latency_class(1000.0), MetricClass::Warning);
        assert_eq!(latency_class(1001.0), MetricClass::Bad);
        assert_eq!(latency_class(500.0), MetricClass::Good);
        assert_eq!(latency_class(500.5), MetricClass::Warning);
        assert_eq!(latency_class(0.0), MetricClass::Good);
    }

    #[test]
    fn test_error_rate_boundaries() {
        assert_eq!(error_rate_class(0.05), MetricClass::Warning);
        assert_eq!(error_rate_class(0.050001), MetricClass::Bad);
        assert_eq!(error_rate_class(0.01), MetricClass::Good);
        assert_eq!(error_rate_class(0.011), MetricClass::Warning);
    }

    #[test]
    fn test_edge_category_and_animation() {
        assert_eq!(edge_category(EdgeStatus::Timeout), EdgeCategory::Failing);
        assert_eq!(edge_category(EdgeStatus::Failing), EdgeCategory::Failing);
        assert_eq!(edge_category(EdgeStatus::Slow), EdgeCategory::Slow);
        assert_eq!(edge_category(EdgeStatus::Retrying), EdgeCategory::Default);
        assert_eq!(EdgeCategory::Default.class_name(), "");

        assert!(edge_animated(EdgeStatus::Slow));
        assert!(edge_animated(EdgeStatus::Failing));
        assert!(!edge_animated(EdgeStatus::Timeout));
        assert!(!edge_animated(EdgeStatus::Normal));
    }

    #[test]
    fn test_color_tables() {
        assert_eq!(edge_status_color(EdgeStatus::Timeout), StatusColor::DarkRed);
        assert_eq!(edge_status_color(EdgeStatus::Slow), StatusColor::Amber);
        assert_eq!(edge_status_color(EdgeStatus::Normal), StatusColor::Green);
        assert_eq!(node_health_color(NodeHealth::Degraded), StatusColor::Amber);
        assert_eq!(node_health_color(NodeHealth::Failing), StatusColor::Red);
        assert_eq!(flow_status_color(FlowStatus::Timeout), StatusColor::Green);
        assert_eq!(flow_status_color(FlowStatus::Failure), StatusColor::Red);
    }

    #[test]
    fn test_error_label_color() {
        assert_eq!(error_label_color(0.0), None);
        assert_eq!(error_label_color(0.02), Some(StatusColor::Amber));
        assert_eq!(error_label_color(0.05), Some(StatusColor::Amber));
        assert_eq!(error_label_color(0.2), Some(StatusColor::Red));
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(0.0), "0ms");
        assert_eq!(format_latency(999.9), "999ms");
        assert_eq!(format_latency(1000.0), "1.0s");
        assert_eq!(format_latency(1530.0), "1.5s");
        assert_eq!(format_error_rate(0.0123), "1.2%");
        assert_eq!(format_error_rate(0.0), "0.0%");
    }
}
