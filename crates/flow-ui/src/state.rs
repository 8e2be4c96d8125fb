//! Selection state for the trace flow explorer
//!
//! 1. SERVER DATA: trace list, services, stats, flow scene, explanation.
//!    Replaced wholesale by fetch results, never edited locally.
//! 2. UI-ONLY STATE: filters, selected trace/node/edge, alert.
//! 3. FETCH LIFECYCLE: one phase + one sequence number per purpose.
//!
//! All transitions go through [`SelectionState::apply`], which performs no
//! I/O. It returns the [`Effect`] (fetch) the caller must run; the fetch
//! result comes back later as another [`Action`] tagged with the sequence
//! number it was issued under. Results whose number is no longer current
//! belong to a superseded request and are dropped.

use std::sync::Arc;

use flow_graph::{CallEdge, FlowScene, FlowView, ServiceNode};
use flow_types::{
    FlowExplanation, FlowStats, RawFlowGraph, TraceFilters, TraceQuery, TraceSummary,
    DEFAULT_TRACE_LIMIT,
};

// =============================================================================
// PHASES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceListPhase {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Why no graph is shown after a flow fetch completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowUnavailable {
    NotFound,
    Malformed(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Unavailable(FlowUnavailable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplanationPhase {
    #[default]
    Idle,
    Loading,
    Ready,
}

// =============================================================================
// ACTIONS / EFFECTS
// =============================================================================

/// Everything fetched on a trace list load (fan-out, all or nothing)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceListPayload {
    pub traces: Vec<TraceSummary>,
    pub services: Vec<String>,
    pub stats: FlowStats,
}

/// Flow fetch failure as seen by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    NotFound,
    Transient(String),
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Mount or explicit refresh
    LoadTraces,
    SetFilters(TraceFilters),
    TraceListLoaded {
        seq: u64,
        result: Result<TraceListPayload, String>,
    },
    SelectTrace(String),
    FlowLoaded {
        seq: u64,
        trace_id: String,
        result: Result<RawFlowGraph, FetchFailure>,
    },
    RequestExplanation,
    ExplanationLoaded {
        seq: u64,
        result: Result<Option<FlowExplanation>, String>,
    },
    ClickNode(String),
    ClickEdge(String),
    ClickPane,
    DismissAlert,
}

/// Fetch the caller must start after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchTraceList { seq: u64, query: TraceQuery },
    FetchFlow { seq: u64, trace_id: String },
    FetchExplanation { seq: u64, trace_id: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Sequences {
    trace_list: u64,
    flow: u64,
    explanation: u64,
}

// =============================================================================
// SELECTION STATE
// =============================================================================

#[derive(Debug, Clone)]
pub struct SelectionState {
    pub filters: TraceFilters,
    pub trace_limit: u32,

    pub trace_list: TraceListPhase,
    pub traces: Vec<TraceSummary>,
    pub services: Vec<String>,
    /// `None` hides the stats panel
    pub stats: Option<FlowStats>,

    pub selected_trace_id: Option<String>,
    pub flow: FlowPhase,
    /// Current graph. While a new flow loads this is the previous one, drawn
    /// under a loading overlay.
    pub scene: Option<Arc<FlowScene>>,
    pub selected_node_id: Option<String>,
    pub selected_edge_id: Option<String>,

    pub explanation_phase: ExplanationPhase,
    pub explanation: Option<FlowExplanation>,

    /// User-visible alert (explanation failures)
    pub alert: Option<String>,

    seq: Sequences,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(TraceFilters::default(), DEFAULT_TRACE_LIMIT)
    }
}

impl SelectionState {
    pub fn new(filters: TraceFilters, trace_limit: u32) -> Self {
        Self {
            filters,
            trace_limit,
            trace_list: TraceListPhase::Idle,
            traces: Vec::new(),
            services: Vec::new(),
            stats: None,
            selected_trace_id: None,
            flow: FlowPhase::Idle,
            scene: None,
            selected_node_id: None,
            selected_edge_id: None,
            explanation_phase: ExplanationPhase::Idle,
            explanation: None,
            alert: None,
            seq: Sequences::default(),
        }
    }

    /// Apply one action. Returns the fetch to start, if any.
    pub fn apply(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::LoadTraces => Some(self.start_trace_list()),
            Action::SetFilters(filters) => {
                self.filters = filters;
                Some(self.start_trace_list())
            }
            Action::TraceListLoaded { seq, result } => {
                self.finish_trace_list(seq, result);
                None
            }
            Action::SelectTrace(trace_id) => Some(self.start_flow(trace_id)),
            Action::FlowLoaded {
                seq,
                trace_id,
                result,
            } => {
                self.finish_flow(seq, &trace_id, result);
                None
            }
            Action::RequestExplanation => self.start_explanation(),
            Action::ExplanationLoaded { seq, result } => {
                self.finish_explanation(seq, result);
                None
            }
            Action::ClickNode(id) => {
                if self.scene_has(|s| s.graph().contains_node(&id)) {
                    self.selected_node_id = toggle(self.selected_node_id.take(), id);
                } else {
                    tracing::debug!(node_id = %id, "ignoring click on unknown node");
                }
                None
            }
            Action::ClickEdge(id) => {
                if self.scene_has(|s| s.graph().contains_edge(&id)) {
                    self.selected_edge_id = toggle(self.selected_edge_id.take(), id);
                } else {
                    tracing::debug!(edge_id = %id, "ignoring click on unknown edge");
                }
                None
            }
            Action::ClickPane => {
                self.clear_highlight();
                None
            }
            Action::DismissAlert => {
                self.alert = None;
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Trace list
    // -------------------------------------------------------------------------

    fn start_trace_list(&mut self) -> Effect {
        self.seq.trace_list += 1;
        self.trace_list = TraceListPhase::Loading;
        Effect::FetchTraceList {
            seq: self.seq.trace_list,
            query: self.filters.to_query(self.trace_limit),
        }
    }

    fn finish_trace_list(&mut self, seq: u64, result: Result<TraceListPayload, String>) {
        if seq != self.seq.trace_list {
            tracing::debug!(seq, current = self.seq.trace_list, "dropping stale trace list");
            return;
        }
        self.trace_list = TraceListPhase::Ready;
        match result {
            Ok(payload) => {
                self.traces = payload.traces;
                self.services = payload.services;
                self.stats = Some(payload.stats);
            }
            Err(error) => {
                tracing::error!(%error, "failed to load flow data");
                self.traces.clear();
                self.services.clear();
                self.stats = None;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Flow
    // -------------------------------------------------------------------------

    fn start_flow(&mut self, trace_id: String) -> Effect {
        self.seq.flow += 1;
        // An explanation in flight belongs to the old trace
        self.seq.explanation += 1;
        self.explanation = None;
        self.explanation_phase = ExplanationPhase::Idle;
        self.clear_highlight();

        self.selected_trace_id = Some(trace_id.clone());
        self.flow = FlowPhase::Loading;
        Effect::FetchFlow {
            seq: self.seq.flow,
            trace_id,
        }
    }

    fn finish_flow(&mut self, seq: u64, trace_id: &str, result: Result<RawFlowGraph, FetchFailure>) {
        if seq != self.seq.flow {
            tracing::debug!(seq, current = self.seq.flow, trace_id, "dropping stale flow");
            return;
        }
        // Previous graph goes regardless of outcome, and so does anything
        // clicked on it while this flow was loading
        self.scene = None;
        self.clear_highlight();
        self.flow = match result {
            Ok(raw) => match FlowScene::from_raw(raw) {
                Ok(scene) => {
                    self.scene = Some(Arc::new(scene));
                    FlowPhase::Ready
                }
                Err(e) => {
                    tracing::warn!(trace_id, error = %e, "discarding flow");
                    FlowPhase::Unavailable(FlowUnavailable::Malformed(e.to_string()))
                }
            },
            Err(FetchFailure::NotFound) => {
                tracing::warn!(trace_id, "flow not found");
                FlowPhase::Unavailable(FlowUnavailable::NotFound)
            }
            Err(FetchFailure::Transient(error)) => {
                tracing::warn!(trace_id, %error, "failed to load flow");
                FlowPhase::Unavailable(FlowUnavailable::Failed(error))
            }
        };
    }

    // -------------------------------------------------------------------------
    // Explanation
    // -------------------------------------------------------------------------

    fn start_explanation(&mut self) -> Option<Effect> {
        let trace_id = self.selected_trace_id.clone()?;
        if self.explanation_phase == ExplanationPhase::Loading {
            return None;
        }
        self.seq.explanation += 1;
        self.explanation_phase = ExplanationPhase::Loading;
        self.explanation = None;
        Some(Effect::FetchExplanation {
            seq: self.seq.explanation,
            trace_id,
        })
    }

    fn finish_explanation(&mut self, seq: u64, result: Result<Option<FlowExplanation>, String>) {
        if seq != self.seq.explanation {
            tracing::debug!(seq, current = self.seq.explanation, "dropping stale explanation");
            return;
        }
        match result {
            Ok(Some(explanation)) => {
                self.explanation = Some(explanation);
                self.explanation_phase = ExplanationPhase::Ready;
            }
            Ok(None) => {
                self.explanation_phase = ExplanationPhase::Idle;
                self.alert = Some("No explanation available for this trace".into());
            }
            Err(error) => {
                tracing::error!(%error, "failed to get explanation");
                self.explanation_phase = ExplanationPhase::Idle;
                self.alert = Some(format!("Failed to generate explanation: {error}"));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    fn scene_has(&self, pred: impl FnOnce(&FlowScene) -> bool) -> bool {
        self.scene.as_deref().is_some_and(pred)
    }

    fn clear_highlight(&mut self) {
        self.selected_node_id = None;
        self.selected_edge_id = None;
    }

    /// Render data for the current scene with selection flags applied
    pub fn view(&self) -> Option<FlowView> {
        self.scene.as_ref().map(|scene| {
            scene.view(
                self.selected_node_id.as_deref(),
                self.selected_edge_id.as_deref(),
            )
        })
    }

    /// A stale graph is on screen while its replacement loads
    pub fn is_flow_overlay(&self) -> bool {
        self.flow == FlowPhase::Loading && self.scene.is_some()
    }

    pub fn selected_trace(&self) -> Option<&TraceSummary> {
        let id = self.selected_trace_id.as_deref()?;
        self.traces.iter().find(|t| t.trace_id == id)
    }

    pub fn selected_node(&self) -> Option<&ServiceNode> {
        let id = self.selected_node_id.as_deref()?;
        self.scene.as_deref()?.graph().node(id)
    }

    pub fn selected_edge(&self) -> Option<&CallEdge> {
        let id = self.selected_edge_id.as_deref()?;
        self.scene.as_deref()?.graph().edge(id)
    }

    /// Explain button state
    pub fn can_request_explanation(&self) -> bool {
        self.selected_trace_id.is_some() && self.explanation_phase != ExplanationPhase::Loading
    }
}

fn toggle(current: Option<String>, clicked: String) -> Option<String> {
    match current {
        Some(id) if id == clicked => None,
        _ => Some(clicked),
    }
}
