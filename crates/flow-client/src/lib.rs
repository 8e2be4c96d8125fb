//! FlowApi trait - the sole data boundary between the explorer and the
//! tracing backend.
//!
//! The UI controller only ever talks to `dyn FlowApi`; `HttpFlowClient` is the
//! production implementation, tests substitute scripted fakes.

pub mod config;
pub mod error;
pub mod http;

use async_trait::async_trait;
use flow_types::{
    Bottleneck, DependencyGraph, FlowAnalysisResult, FlowStats, RawFlowGraph, TraceQuery,
    TraceSummary,
};

pub use config::FlowApiConfig;
pub use error::ClientError;
pub use http::HttpFlowClient;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Default result count for the bottleneck flow list
pub const DEFAULT_BOTTLENECK_LIMIT: u32 = 20;

#[async_trait]
pub trait FlowApi: Send + Sync {
    /// Service names seen in the lookback window, for the filter dropdown
    async fn list_services(&self) -> Result<Vec<String>>;

    /// Trace summaries, most recent first
    async fn list_traces(&self, query: &TraceQuery) -> Result<Vec<TraceSummary>>;

    /// Aggregate counts for the header panel
    async fn stats(&self, lookback_ms: u64) -> Result<FlowStats>;

    /// Raw flow graph of one trace. Unknown trace → `ClientError::NotFound`.
    async fn fetch_flow(&self, trace_id: &str) -> Result<RawFlowGraph>;

    /// Ask the backend to analyse and explain a trace
    async fn explain(&self, trace_id: &str) -> Result<FlowAnalysisResult>;

    /// Traces flagged with at least one bottleneck
    async fn bottleneck_flows(&self, limit: u32, lookback_ms: u64) -> Result<Vec<TraceSummary>>;

    /// Bottlenecks detected in one trace
    async fn flow_bottlenecks(&self, trace_id: &str) -> Result<Vec<Bottleneck>>;

    /// Service-to-service call topology aggregated over the lookback window
    async fn dependencies(&self, lookback_ms: u64) -> Result<DependencyGraph>;
}
