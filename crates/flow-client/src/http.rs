//! HttpFlowClient - `FlowApi` over the backend's REST endpoints
//!
//! No client-side timeout is set; requests inherit the transport defaults.

use async_trait::async_trait;
use flow_types::{
    Bottleneck, DependencyGraph, FlowAnalysisResult, FlowStats, RawFlowGraph, TraceQuery,
    TraceSummary,
};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::FlowApiConfig;
use crate::error::ClientError;
use crate::{FlowApi, Result};

#[derive(Clone, Debug)]
pub struct HttpFlowClient {
    base_url: Url,
    client: Client,
}

impl HttpFlowClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "not a base url".into(),
            });
        }
        Ok(Self {
            base_url: parsed,
            client: Client::new(),
        })
    }

    pub fn from_config(config: &FlowApiConfig) -> Result<Self> {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(segments);
        tracing::debug!(%method, %url, "flow api request");

        let response = self
            .client
            .request(method, url.clone())
            .query(query)
            .send()
            .await?;
        let body = Self::check(response, &url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn check(response: Response, url: &Url) -> Result<Vec<u8>> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl FlowApi for HttpFlowClient {
    async fn list_services(&self) -> Result<Vec<String>> {
        self.send(Method::GET, &["flows", "services"], &[]).await
    }

    async fn list_traces(&self, query: &TraceQuery) -> Result<Vec<TraceSummary>> {
        let mut params = vec![
            ("limit", query.limit.to_string()),
            ("lookbackMs", query.lookback_ms.to_string()),
        ];
        if let Some(service) = &query.service_name {
            params.push(("serviceName", service.clone()));
        }
        self.send(Method::GET, &["flows", "traces"], &params).await
    }

    async fn stats(&self, lookback_ms: u64) -> Result<FlowStats> {
        self.send(
            Method::GET,
            &["flows", "stats"],
            &[("lookbackMs", lookback_ms.to_string())],
        )
        .await
    }

    async fn fetch_flow(&self, trace_id: &str) -> Result<RawFlowGraph> {
        self.send(Method::GET, &["flows", trace_id], &[])
            .await
            .map_err(|e| match e {
                ClientError::NotFound(_) => ClientError::NotFound(trace_id.to_string()),
                other => other,
            })
    }

    async fn explain(&self, trace_id: &str) -> Result<FlowAnalysisResult> {
        self.send(Method::POST, &["flows", trace_id, "explain"], &[])
            .await
    }

    async fn bottleneck_flows(&self, limit: u32, lookback_ms: u64) -> Result<Vec<TraceSummary>> {
        self.send(
            Method::GET,
            &["flows", "bottlenecks"],
            &[
                ("limit", limit.to_string()),
                ("lookbackMs", lookback_ms.to_string()),
            ],
        )
        .await
    }

    async fn flow_bottlenecks(&self, trace_id: &str) -> Result<Vec<Bottleneck>> {
        self.send(Method::GET, &["flows", trace_id, "bottlenecks"], &[])
            .await
    }

    async fn dependencies(&self, lookback_ms: u64) -> Result<DependencyGraph> {
        self.send(
            Method::GET,
            &["flows", "dependencies"],
            &[("lookbackMs", lookback_ms.to_string())],
        )
        .await
    }
}
