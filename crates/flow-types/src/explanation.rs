//! Flow analysis types (POST /flows/{traceId}/explain, GET .../bottlenecks)

use serde::{Deserialize, Serialize};

use crate::RawFlowGraph;

/// AI-generated explanation of one trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowExplanation {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub bottleneck_service: Option<String>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub estimated_impact: Option<String>,
}

/// Full response of the explain endpoint. Only `explanation` is consumed by
/// the explorer; the graph and bottlenecks are carried for operators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowAnalysisResult {
    #[serde(default)]
    pub graph: Option<RawFlowGraph>,
    #[serde(default)]
    pub bottlenecks: Vec<Bottleneck>,
    #[serde(default)]
    pub explanation: Option<FlowExplanation>,
}

/// Kind of bottleneck flagged upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BottleneckType {
    HighErrorRate,
    HighLatency,
    CriticalLatency,
    RelativeSlowness,
    Timeout,
    HighFanOut,
    CascadingFailure,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BottleneckSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A node or edge the backend flagged for disproportionate latency/errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    /// Node id or edge id
    pub element_id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(rename = "type")]
    pub bottleneck_type: BottleneckType,
    pub severity: BottleneckSeverity,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_result_with_explanation() {
        let json = r#"{
            "bottlenecks": [
                {"elementId": "payment:POST:_charge", "serviceName": "payment",
                 "type": "HIGH_LATENCY", "severity": "HIGH", "description": "slow"}
            ],
            "explanation": {
                "summary": "Payment dominated the request",
                "bottleneckService": "payment",
                "recommendations": ["Add caching"],
                "estimatedImpact": "HIGH"
            }
        }"#;
        let result: FlowAnalysisResult = serde_json::from_str(json).unwrap();
        assert!(result.graph.is_none());
        assert_eq!(result.bottlenecks[0].severity, BottleneckSeverity::High);
        let explanation = result.explanation.unwrap();
        assert_eq!(explanation.bottleneck_service.as_deref(), Some("payment"));
        assert_eq!(explanation.recommendations, vec!["Add caching".to_string()]);
        assert!(explanation.root_cause.is_none());
    }

    #[test]
    fn test_unknown_bottleneck_type() {
        let json = r#"{"elementId":"x","type":"GREMLINS","severity":"LOW"}"#;
        let b: Bottleneck = serde_json::from_str(json).unwrap();
        assert_eq!(b.bottleneck_type, BottleneckType::Other);
        assert!(BottleneckSeverity::Critical > BottleneckSeverity::Low);
    }
}
