//! Wire schema for the pipeline execution unit.
//!
//! The runner and the execution unit communicate only through these two
//! shapes. Requests carry `action: "run"`; responses are tagged `data` or
//! `end`. Multiple `data` messages may precede exactly one `end` per id, and
//! no message for an id may follow its `end`. Unrecognized message shapes
//! are dropped, never fatal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A pipeline execution request.
///
/// `id` is a correlation token minted by the runner, unique per outstanding
/// request; `files` is the pre-resolved set of named text blobs the pipeline
/// verbs operate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PipelineMessage {
    Run(PipelineRequest),
}

/// Payload of a `run` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub id: u64,
    pub command: String,
    pub files: BTreeMap<String, String>,
}

/// A response from the execution unit, correlated by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipelineResponse {
    Data { id: u64, chunk: String },
    End { id: u64 },
}

impl PipelineResponse {
    /// Correlation id this response belongs to.
    pub fn id(&self) -> u64 {
        match self {
            PipelineResponse::Data { id, .. } | PipelineResponse::End { id } => *id,
        }
    }
}

/// Parse a request off the wire. Unrecognized shapes yield `None`.
pub fn parse_request(text: &str) -> Option<PipelineMessage> {
    serde_json::from_str(text).ok()
}

/// Parse a response off the wire. Unrecognized shapes yield `None`.
pub fn parse_response(text: &str) -> Option<PipelineResponse> {
    serde_json::from_str(text).ok()
}
