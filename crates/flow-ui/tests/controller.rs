//! FlowController against a scripted FlowApi

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use egui::{Pos2, Rect, Vec2};
use flow_client::{ClientError, FlowApi, Result};
use flow_graph::HitTarget;
use flow_types::{
    Bottleneck, DependencyGraph, FlowAnalysisResult, FlowExplanation, FlowStats, RawCallEdge,
    RawFlowGraph, RawServiceNode, TraceFilters, TraceQuery, TraceSummary,
};
use flow_ui::{ExplanationPhase, FlowController, FlowPhase, FlowUnavailable, SelectionState};
use pretty_assertions::assert_eq;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

type FlowGate = oneshot::Receiver<Result<RawFlowGraph>>;

/// Flow fetches block until the test releases them through a oneshot
#[derive(Default)]
struct ScriptedApi {
    traces: Vec<TraceSummary>,
    services_fail: bool,
    flows: Mutex<HashMap<String, FlowGate>>,
    explanation: Mutex<Option<Result<FlowAnalysisResult>>>,
    queries: Mutex<Vec<TraceQuery>>,
}

impl ScriptedApi {
    fn gate(&self, trace_id: &str) -> oneshot::Sender<Result<RawFlowGraph>> {
        let (tx, rx) = oneshot::channel();
        self.flows.lock().unwrap().insert(trace_id.to_string(), rx);
        tx
    }
}

#[async_trait]
impl FlowApi for ScriptedApi {
    async fn list_services(&self) -> Result<Vec<String>> {
        if self.services_fail {
            return Err(ClientError::Http {
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(vec!["checkout".into(), "payment".into()])
    }

    async fn list_traces(&self, query: &TraceQuery) -> Result<Vec<TraceSummary>> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.traces.clone())
    }

    async fn stats(&self, _lookback_ms: u64) -> Result<FlowStats> {
        Ok(FlowStats {
            total_flows: self.traces.len() as u64,
            ..Default::default()
        })
    }

    async fn fetch_flow(&self, trace_id: &str) -> Result<RawFlowGraph> {
        let gate = self.flows.lock().unwrap().remove(trace_id);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::NotFound(trace_id.into()))),
            None => Err(ClientError::NotFound(trace_id.into())),
        }
    }

    async fn explain(&self, trace_id: &str) -> Result<FlowAnalysisResult> {
        self.explanation
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ClientError::NotFound(trace_id.into())))
    }

    async fn bottleneck_flows(&self, _limit: u32, _lookback_ms: u64) -> Result<Vec<TraceSummary>> {
        Ok(Vec::new())
    }

    async fn flow_bottlenecks(&self, _trace_id: &str) -> Result<Vec<Bottleneck>> {
        Ok(Vec::new())
    }

    async fn dependencies(&self, _lookback_ms: u64) -> Result<DependencyGraph> {
        Ok(DependencyGraph::default())
    }
}

fn graph(prefix: &str) -> RawFlowGraph {
    let node = |name: &str| RawServiceNode {
        id: Some(format!("{prefix}-{name}")),
        service_name: Some(name.into()),
        ..Default::default()
    };
    RawFlowGraph {
        trace_id: Some(prefix.into()),
        nodes: Some(vec![node("gateway"), node("orders")]),
        edges: Some(vec![RawCallEdge {
            source_node_id: Some(format!("{prefix}-gateway")),
            target_node_id: Some(format!("{prefix}-orders")),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

fn controller(api: Arc<ScriptedApi>) -> FlowController {
    FlowController::new(api, SelectionState::default(), Handle::current())
}

fn shown_trace(ctl: &FlowController) -> Option<String> {
    ctl.state()
        .scene
        .as_ref()
        .and_then(|s| s.graph().meta().trace_id.clone())
}

#[tokio::test]
async fn test_initial_load_fans_out() {
    let api = Arc::new(ScriptedApi {
        traces: vec![TraceSummary::new("t1"), TraceSummary::new("t2")],
        ..Default::default()
    });
    let mut ctl = controller(api.clone());

    ctl.load_traces().unwrap().await.unwrap();
    assert_eq!(ctl.process_async_results(), 1);

    let state = ctl.state();
    assert_eq!(state.traces.len(), 2);
    assert_eq!(state.services, vec!["checkout".to_string(), "payment".to_string()]);
    assert_eq!(state.stats.as_ref().map(|s| s.total_flows), Some(2));
    assert_eq!(api.queries.lock().unwrap()[0].limit, 50);
}

#[tokio::test]
async fn test_fan_out_failure_empties_list() {
    let api = Arc::new(ScriptedApi {
        traces: vec![TraceSummary::new("t1")],
        services_fail: true,
        ..Default::default()
    });
    let mut ctl = controller(api);

    ctl.load_traces().unwrap().await.unwrap();
    ctl.process_async_results();

    assert!(ctl.state().traces.is_empty());
    assert!(ctl.state().stats.is_none());
    assert!(ctl.state().alert.is_none());
}

#[tokio::test]
async fn test_filter_change_passes_query() {
    let api = Arc::new(ScriptedApi::default());
    let mut ctl = controller(api.clone());

    ctl.set_filters(TraceFilters {
        service_name: Some("payment".into()),
        time_range: flow_types::TimeRange::FifteenMinutes,
    })
    .unwrap()
    .await
    .unwrap();

    let queries = api.queries.lock().unwrap();
    assert_eq!(queries[0].service_name.as_deref(), Some("payment"));
    assert_eq!(queries[0].lookback_ms, 900_000);
}

#[tokio::test]
async fn test_later_selection_wins_when_it_resolves_first() {
    let api = Arc::new(ScriptedApi::default());
    let t1 = api.gate("t1");
    let t2 = api.gate("t2");
    let mut ctl = controller(api);

    let h1 = ctl.select_trace("t1").unwrap();
    let h2 = ctl.select_trace("t2").unwrap();

    t2.send(Ok(graph("t2"))).unwrap();
    h2.await.unwrap();
    ctl.process_async_results();
    assert_eq!(shown_trace(&ctl).as_deref(), Some("t2"));

    t1.send(Ok(graph("t1"))).unwrap();
    h1.await.unwrap();
    ctl.process_async_results();
    assert_eq!(shown_trace(&ctl).as_deref(), Some("t2"));
    assert_eq!(ctl.state().flow, FlowPhase::Ready);
}

#[tokio::test]
async fn test_later_selection_wins_when_it_resolves_last() {
    let api = Arc::new(ScriptedApi::default());
    let t1 = api.gate("t1");
    let t2 = api.gate("t2");
    let mut ctl = controller(api);

    let h1 = ctl.select_trace("t1").unwrap();
    let h2 = ctl.select_trace("t2").unwrap();

    t1.send(Ok(graph("t1"))).unwrap();
    h1.await.unwrap();
    ctl.process_async_results();
    assert_eq!(shown_trace(&ctl), None);
    assert_eq!(ctl.state().flow, FlowPhase::Loading);

    t2.send(Ok(graph("t2"))).unwrap();
    h2.await.unwrap();
    ctl.process_async_results();
    assert_eq!(shown_trace(&ctl).as_deref(), Some("t2"));
    let graph = ctl.state().scene.as_ref().unwrap().graph();
    assert!(graph.nodes().iter().all(|n| n.id.starts_with("t2-")));
}

#[tokio::test]
async fn test_unknown_trace_clears_previous_graph() {
    let api = Arc::new(ScriptedApi::default());
    let t1 = api.gate("t1");
    let mut ctl = controller(api);

    let h = ctl.select_trace("t1").unwrap();
    t1.send(Ok(graph("t1"))).unwrap();
    h.await.unwrap();
    ctl.process_async_results();
    assert!(ctl.state().scene.is_some());

    // No gate registered: backend answers 404
    let h = ctl.select_trace("gone").unwrap();
    assert!(ctl.state().is_flow_overlay());
    h.await.unwrap();
    ctl.process_async_results();

    assert!(ctl.state().scene.is_none());
    assert_eq!(
        ctl.state().flow,
        FlowPhase::Unavailable(FlowUnavailable::NotFound)
    );
}

#[tokio::test]
async fn test_explanation_round_trip_and_failure() {
    let api = Arc::new(ScriptedApi::default());
    let t1 = api.gate("t1");
    *api.explanation.lock().unwrap() = Some(Ok(FlowAnalysisResult {
        explanation: Some(FlowExplanation {
            summary: "orders waits on the database".into(),
            bottleneck_service: Some("orders".into()),
            ..Default::default()
        }),
        ..Default::default()
    }));
    let mut ctl = controller(api.clone());

    assert!(ctl.request_explanation().is_none());

    let h = ctl.select_trace("t1").unwrap();
    t1.send(Ok(graph("t1"))).unwrap();
    h.await.unwrap();
    ctl.process_async_results();

    ctl.request_explanation().unwrap().await.unwrap();
    ctl.process_async_results();
    assert_eq!(ctl.state().explanation_phase, ExplanationPhase::Ready);
    assert_eq!(
        ctl.state().explanation.as_ref().and_then(|e| e.bottleneck_service.as_deref()),
        Some("orders")
    );

    // Scripted response consumed: the next request fails
    ctl.request_explanation().unwrap().await.unwrap();
    ctl.process_async_results();
    assert!(ctl.state().alert.is_some());
    assert!(ctl.state().can_request_explanation());
    ctl.dismiss_alert();
    assert!(ctl.state().alert.is_none());
}

#[tokio::test]
async fn test_click_at_selects_and_pane_clears() {
    let api = Arc::new(ScriptedApi::default());
    let t1 = api.gate("t1");
    let mut ctl = controller(api);

    let h = ctl.select_trace("t1").unwrap();
    t1.send(Ok(graph("t1"))).unwrap();
    h.await.unwrap();
    ctl.process_async_results();

    let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(1200.0, 800.0));
    let transform = ctl.fit_transform(screen);
    let node_center = ctl
        .state()
        .view()
        .and_then(|v| v.node("t1-orders").map(|n| n.rect().center()))
        .unwrap();

    let hit = ctl.click_at(transform.world_to_screen(node_center), &transform);
    assert_eq!(hit, Some(HitTarget::Node("t1-orders".into())));
    assert_eq!(ctl.state().selected_node_id.as_deref(), Some("t1-orders"));

    assert_eq!(ctl.click_at(Pos2::new(2.0, 2.0), &transform), None);
    assert!(ctl.state().selected_node_id.is_none());
}
