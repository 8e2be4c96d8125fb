//! Trace list, stats, and query types (GET /flows/traces, GET /flows/stats)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of traces requested for the trace list
pub const DEFAULT_TRACE_LIMIT: u32 = 50;

/// Default lookback window (1 hour)
pub const DEFAULT_LOOKBACK_MS: u64 = 60 * 60 * 1000;

/// Overall outcome of one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    #[default]
    Success,
    PartialFailure,
    Failure,
    Timeout,
    #[serde(other)]
    Unknown,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Success => "SUCCESS",
            FlowStatus::PartialFailure => "PARTIAL_FAILURE",
            FlowStatus::Failure => "FAILURE",
            FlowStatus::Timeout => "TIMEOUT",
            FlowStatus::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for FlowStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().replace('-', "_").as_str() {
            "SUCCESS" => Self::Success,
            "PARTIAL_FAILURE" => Self::PartialFailure,
            "FAILURE" => Self::Failure,
            "TIMEOUT" => Self::Timeout,
            _ => Self::Unknown,
        })
    }
}

/// One row of the trace list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    pub trace_id: String,
    #[serde(default)]
    pub root_service: String,
    #[serde(default)]
    pub root_endpoint: Option<String>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub status: FlowStatus,
    #[serde(default)]
    pub node_count: u32,
    #[serde(default)]
    pub has_bottleneck: bool,
    #[serde(default)]
    pub bottleneck_service: Option<String>,
    #[serde(default, deserialize_with = "crate::de::opt_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
}

impl TraceSummary {
    /// Minimal summary for a trace id (e.g. selected from a deep link)
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            root_service: String::new(),
            root_endpoint: None,
            duration_ms: 0,
            status: FlowStatus::default(),
            node_count: 0,
            has_bottleneck: false,
            bottleneck_service: None,
            start_time: None,
        }
    }
}

/// Aggregate counts for the header panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStats {
    #[serde(default)]
    pub total_flows: u64,
    #[serde(default)]
    pub successful_flows: u64,
    #[serde(default)]
    pub failed_flows: u64,
    #[serde(default)]
    pub service_count: u32,
    #[serde(default)]
    pub services: Vec<String>,
}

// ============================================================================
// QUERY
// ============================================================================

/// Lookback windows offered by the trace list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl TimeRange {
    pub fn as_millis(&self) -> u64 {
        const MINUTE: u64 = 60 * 1000;
        match self {
            TimeRange::FifteenMinutes => 15 * MINUTE,
            TimeRange::OneHour => 60 * MINUTE,
            TimeRange::SixHours => 6 * 60 * MINUTE,
            TimeRange::TwentyFourHours => 24 * 60 * MINUTE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::FifteenMinutes => "15m",
            TimeRange::OneHour => "1h",
            TimeRange::SixHours => "6h",
            TimeRange::TwentyFourHours => "24h",
        }
    }

    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeRange::FifteenMinutes => "Last 15 min",
            TimeRange::OneHour => "Last 1 hour",
            TimeRange::SixHours => "Last 6 hours",
            TimeRange::TwentyFourHours => "Last 24 hours",
        }
    }

    pub fn all() -> &'static [TimeRange] {
        &[
            TimeRange::FifteenMinutes,
            TimeRange::OneHour,
            TimeRange::SixHours,
            TimeRange::TwentyFourHours,
        ]
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised time range label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time range '{0}' (expected 15m, 1h, 6h or 24h)")]
pub struct UnknownTimeRange(pub String);

impl FromStr for TimeRange {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::all()
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTimeRange(s.to_string()))
    }
}

/// Parameters for GET /flows/traces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    pub limit: u32,
    pub lookback_ms: u64,
}

impl Default for TraceQuery {
    fn default() -> Self {
        Self {
            service_name: None,
            limit: DEFAULT_TRACE_LIMIT,
            lookback_ms: DEFAULT_LOOKBACK_MS,
        }
    }
}

/// Trace list filter as chosen in the UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceFilters {
    /// Empty / None = all services
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub time_range: TimeRange,
}

impl TraceFilters {
    /// Convert to a backend query with the given result limit
    pub fn to_query(&self, limit: u32) -> TraceQuery {
        TraceQuery {
            service_name: self
                .service_name
                .as_ref()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            limit,
            lookback_ms: self.time_range.as_millis(),
        }
    }
}
