//! Client configuration, read from the environment (`.env` is loaded by the
//! binary before this runs).

use flow_types::{TimeRange, TraceFilters, TraceQuery, DEFAULT_TRACE_LIMIT};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

pub const ENV_BASE_URL: &str = "FLOW_API_BASE_URL";
pub const ENV_TRACE_LIMIT: &str = "FLOW_TRACE_LIMIT";
pub const ENV_LOOKBACK: &str = "FLOW_LOOKBACK";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowApiConfig {
    /// Base URL including the `/api` prefix, no trailing slash needed
    pub base_url: String,
    /// Traces requested per list load
    pub trace_limit: u32,
    /// Initial lookback window
    pub lookback: TimeRange,
}

impl Default for FlowApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            trace_limit: DEFAULT_TRACE_LIMIT,
            lookback: TimeRange::default(),
        }
    }
}

impl FlowApiConfig {
    /// Read `FLOW_API_BASE_URL`, `FLOW_TRACE_LIMIT` and `FLOW_LOOKBACK`.
    /// Unset or unparseable values fall back to defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup(ENV_BASE_URL)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);

        let trace_limit = match lookup(ENV_TRACE_LIMIT) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid {ENV_TRACE_LIMIT}");
                    defaults.trace_limit
                }
            },
            None => defaults.trace_limit,
        };

        let lookback = match lookup(ENV_LOOKBACK) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring invalid {ENV_LOOKBACK}");
                defaults.lookback
            }),
            None => defaults.lookback,
        };

        Self {
            base_url,
            trace_limit,
            lookback,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Filters the explorer starts with
    pub fn initial_filters(&self) -> TraceFilters {
        TraceFilters {
            service_name: None,
            time_range: self.lookback,
        }
    }

    pub fn trace_query(&self, filters: &TraceFilters) -> TraceQuery {
        filters.to_query(self.trace_limit)
    }
}
