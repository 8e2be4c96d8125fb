//! Graph build errors.
//!
//! Every variant describes a malformed backend payload: the graph is treated
//! as absent and nothing is rendered.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("malformed graph: payload has no `{0}` array")]
    MissingArray(&'static str),

    #[error("malformed graph: node at index {index} has no id")]
    MissingNodeId { index: usize },

    #[error("malformed graph: duplicate node id `{0}`")]
    DuplicateNode(String),

    #[error("malformed graph: edge at index {index} has no {end} node id")]
    MissingEndpoint { index: usize, end: &'static str },

    #[error("malformed graph: edge `{edge_id}` references unknown node `{node_id}`")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("malformed graph: duplicate edge id `{0}`")]
    DuplicateEdge(String),
}
