//! Per-request records owned by the orchestrator.

use crate::classifier::ClassificationDecision;
use crate::engine::{CatalogRef, InvocationResult, Message};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One inbound message to gate.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub request_id: String,
    pub session_id: String,
    pub agent_id: String,
    pub message_text: String,
    /// Passed through to the catalog resolver untouched.
    pub catalog: CatalogRef,
    /// Capability names the caller already knows, used only for leakage
    /// detection on the no-capability path.
    pub capability_names_hint: Vec<String>,
    /// Earlier conversation turns, sent ahead of `message_text`.
    pub history: Vec<Message>,
}

impl PipelineRequest {
    pub fn new(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        message_text: impl Into<String>,
    ) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            message_text: message_text.into(),
            catalog: CatalogRef::default(),
            capability_names_hint: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogRef) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_capability_names_hint(mut self, names: Vec<String>) -> Self {
        self.capability_names_hint = names;
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Which branch of the state machine produced the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePath {
    /// Classified as not needing capabilities, answered without them.
    NoCapabilities,
    /// Classified as needing capabilities.
    Capabilities,
    /// Answered without capabilities first, then retried with them.
    Fallback,
}

impl PipelinePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePath::NoCapabilities => "no_capabilities",
            PipelinePath::Capabilities => "capabilities",
            PipelinePath::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PipelinePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time spent per stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageTimings {
    pub classification_ms: u64,
    pub catalog_ms: u64,
    pub completion_ms: u64,
    pub execution_ms: u64,
    pub total_ms: u64,
}

/// Terminal record of one request, handed to the metrics collector.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub request_id: String,
    pub agent_id: String,
    pub response: String,
    pub decision: ClassificationDecision,
    pub path: PipelinePath,
    pub capabilities_loaded: bool,
    pub capabilities_executed: bool,
    pub fallback_triggered: bool,
    pub invocations: Vec<InvocationResult>,
    pub timings: StageTimings,
    pub completed_at: DateTime<Utc>,
}

impl PipelineOutcome {
    pub fn cache_hit(&self) -> bool {
        self.decision.is_cache_hit()
    }
}
