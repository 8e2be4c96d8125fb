//! FlowController - runs the fetches that SelectionState asks for
//!
//! Pattern:
//! 1. A user action is applied to `SelectionState`, which may return an Effect
//! 2. The effect is spawned on the tokio runtime against `dyn FlowApi`
//! 3. The task pushes its result into `AsyncState` and requests a repaint
//! 4. `process_async_results()` (called every frame) extracts all pending
//!    results, drops the lock, then applies each one as an Action

use std::sync::{Arc, Mutex};

use egui::{Pos2, Rect};
use flow_client::{ClientError, FlowApi};
use flow_graph::{HitTarget, SpatialIndex, ViewTransform};
use flow_types::{FlowExplanation, RawFlowGraph, TraceFilters};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::state::{Action, Effect, FetchFailure, SelectionState, TraceListPayload};

/// Pick radius for clicks, screen pixels
pub const CLICK_RADIUS_PX: f32 = 6.0;

// =============================================================================
// ASYNC STATE
// =============================================================================

/// Results written by spawned tasks, drained by the update loop.
///
/// Vectors rather than single slots: a superseded flow can complete after its
/// replacement and must not overwrite it before the drain.
#[derive(Debug, Default)]
pub struct AsyncState {
    pub pending_trace_lists: Vec<(u64, Result<TraceListPayload, String>)>,
    pub pending_flows: Vec<(u64, String, Result<RawFlowGraph, FetchFailure>)>,
    pub pending_explanations: Vec<(u64, Result<Option<FlowExplanation>, String>)>,
}

/// Everything extracted from AsyncState in one lock
#[derive(Debug, Default)]
pub struct PendingResults {
    pub trace_lists: Vec<(u64, Result<TraceListPayload, String>)>,
    pub flows: Vec<(u64, String, Result<RawFlowGraph, FetchFailure>)>,
    pub explanations: Vec<(u64, Result<Option<FlowExplanation>, String>)>,
}

impl PendingResults {
    pub fn is_empty(&self) -> bool {
        self.trace_lists.is_empty() && self.flows.is_empty() && self.explanations.is_empty()
    }

    fn into_actions(self) -> impl Iterator<Item = Action> {
        let lists = self
            .trace_lists
            .into_iter()
            .map(|(seq, result)| Action::TraceListLoaded { seq, result });
        let flows = self
            .flows
            .into_iter()
            .map(|(seq, trace_id, result)| Action::FlowLoaded {
                seq,
                trace_id,
                result,
            });
        let explanations = self
            .explanations
            .into_iter()
            .map(|(seq, result)| Action::ExplanationLoaded { seq, result });
        lists.chain(flows).chain(explanations)
    }
}

impl AsyncState {
    pub fn extract_pending(&mut self) -> PendingResults {
        PendingResults {
            trace_lists: std::mem::take(&mut self.pending_trace_lists),
            flows: std::mem::take(&mut self.pending_flows),
            explanations: std::mem::take(&mut self.pending_explanations),
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct FlowController {
    state: SelectionState,
    api: Arc<dyn FlowApi>,
    async_state: Arc<Mutex<AsyncState>>,
    runtime: Handle,
    repaint: Option<egui::Context>,
}

impl FlowController {
    /// `runtime` is where fetches are spawned; the UI thread never blocks on
    /// them.
    pub fn new(api: Arc<dyn FlowApi>, state: SelectionState, runtime: Handle) -> Self {
        Self {
            state,
            api,
            async_state: Arc::new(Mutex::new(AsyncState::default())),
            runtime,
            repaint: None,
        }
    }

    /// Request an egui repaint whenever a fetch completes
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Apply an action and start whatever fetch it asks for
    pub fn dispatch(&mut self, action: Action) -> Option<JoinHandle<()>> {
        self.state.apply(action).map(|effect| self.spawn(effect))
    }

    pub fn load_traces(&mut self) -> Option<JoinHandle<()>> {
        self.dispatch(Action::LoadTraces)
    }

    pub fn set_filters(&mut self, filters: TraceFilters) -> Option<JoinHandle<()>> {
        self.dispatch(Action::SetFilters(filters))
    }

    pub fn select_trace(&mut self, trace_id: impl Into<String>) -> Option<JoinHandle<()>> {
        self.dispatch(Action::SelectTrace(trace_id.into()))
    }

    pub fn request_explanation(&mut self) -> Option<JoinHandle<()>> {
        self.dispatch(Action::RequestExplanation)
    }

    pub fn click_node(&mut self, node_id: impl Into<String>) {
        self.dispatch(Action::ClickNode(node_id.into()));
    }

    pub fn click_edge(&mut self, edge_id: impl Into<String>) {
        self.dispatch(Action::ClickEdge(edge_id.into()));
    }

    pub fn click_pane(&mut self) {
        self.dispatch(Action::ClickPane);
    }

    pub fn dismiss_alert(&mut self) {
        self.dispatch(Action::DismissAlert);
    }

    /// Resolve a click on the canvas. `transform` is the one the canvas was
    /// drawn with. Returns what was hit (`None` = pane).
    pub fn click_at(&mut self, screen: Pos2, transform: &ViewTransform) -> Option<HitTarget> {
        let view = self.state.view()?;
        let world = transform.screen_to_world(screen);
        let radius = CLICK_RADIUS_PX / transform.zoom.max(f32::EPSILON);
        let hit = SpatialIndex::from_view(&view).hit_test(world, radius);

        match &hit {
            Some(HitTarget::Node(id)) => self.click_node(id.clone()),
            Some(HitTarget::Edge(id)) => self.click_edge(id.clone()),
            None => self.click_pane(),
        }
        hit
    }

    /// Transform that fits the current graph into `screen`
    pub fn fit_transform(&self, screen: Rect) -> ViewTransform {
        let bounds = self.state.view().and_then(|v| v.bounds());
        ViewTransform::fit(bounds, screen)
    }

    /// Drain completed fetches into the state. Returns how many were applied.
    pub fn process_async_results(&mut self) -> usize {
        let pending = match self.async_state.lock() {
            Ok(mut guard) => guard.extract_pending(),
            Err(_) => {
                tracing::error!("async state lock poisoned");
                return 0;
            }
        };
        if pending.is_empty() {
            return 0;
        }

        let mut applied = 0;
        for action in pending.into_actions() {
            // Completions never produce follow-up fetches
            let _ = self.state.apply(action);
            applied += 1;
        }
        applied
    }

    fn spawn(&self, effect: Effect) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let async_state = Arc::clone(&self.async_state);
        let repaint = self.repaint.clone();

        self.runtime.spawn(async move {
            match effect {
                Effect::FetchTraceList { seq, query } => {
                    let result = tokio::try_join!(
                        api.list_traces(&query),
                        api.list_services(),
                        api.stats(query.lookback_ms),
                    )
                    .map(|(traces, services, stats)| TraceListPayload {
                        traces,
                        services,
                        stats,
                    })
                    .map_err(|e| e.to_string());
                    push_pending(&async_state, |state| {
                        state.pending_trace_lists.push((seq, result))
                    });
                }
                Effect::FetchFlow { seq, trace_id } => {
                    let result = api.fetch_flow(&trace_id).await.map_err(|e| match e {
                        ClientError::NotFound(_) => FetchFailure::NotFound,
                        other => FetchFailure::Transient(other.to_string()),
                    });
                    push_pending(&async_state, |state| {
                        state.pending_flows.push((seq, trace_id, result))
                    });
                }
                Effect::FetchExplanation { seq, trace_id } => {
                    let result = api
                        .explain(&trace_id)
                        .await
                        .map(|analysis| analysis.explanation)
                        .map_err(|e| e.to_string());
                    push_pending(&async_state, |state| {
                        state.pending_explanations.push((seq, result))
                    });
                }
            }
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        })
    }
}

/// Hand a fetch result to the update loop. A poisoned lock loses the result.
fn push_pending(async_state: &Mutex<AsyncState>, push: impl FnOnce(&mut AsyncState)) {
    match async_state.lock() {
        Ok(mut guard) => push(&mut guard),
        Err(_) => tracing::error!("async state lock poisoned, dropping fetch result"),
    }
}

impl std::fmt::Debug for FlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
