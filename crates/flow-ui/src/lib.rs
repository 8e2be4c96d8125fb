//! Trace flow explorer - selection and fetch coordination
//!
//! `state` is the pure state machine (trace list, flow, explanation,
//! node/edge highlight). `controller` wires it to a `FlowApi` and the tokio
//! runtime.

pub mod controller;
pub mod state;

pub use controller::{AsyncState, FlowController, PendingResults};
pub use state::{
    Action, Effect, ExplanationPhase, FetchFailure, FlowPhase, FlowUnavailable, SelectionState,
    TraceListPayload, TraceListPhase,
};
