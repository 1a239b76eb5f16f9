//! Collaborator interfaces consumed by the gating pipeline.
//!
//! The pipeline never talks to a model, a tool catalog or a tool runner
//! directly. Each of them sits behind one of the traits below so the
//! enclosing service can plug in its own implementation (and tests can plug
//! in counting doubles).
//!
//! # Object Safety
//!
//! All traits are object-safe and meant to be shared as `Arc<dyn Trait>`.
//! Async methods use `async_trait`.
//!
//! # Cancellation Safety
//!
//! Implementations must be cancellation-safe: the orchestrator drops the
//! in-flight future when a timeout fires or the caller cancels the request.

use async_trait::async_trait;

pub mod error;
pub mod openai;
pub mod types;

pub use error::EngineError;
pub use openai::OpenAiCompatClient;
pub use types::{
    CapabilityDefinition, CapabilitySchema, CatalogRef, Completion, InvocationOutcome,
    InvocationRequest, InvocationResult, Message, Role,
};

/// Resolves the capability set available to an agent/session.
///
/// Only called on paths that actually need capabilities. Must be idempotent.
#[async_trait]
pub trait CapabilityCatalogResolver: Send + Sync + 'static {
    async fn resolve(
        &self,
        agent_id: &str,
        session_id: &str,
        catalog: &CatalogRef,
    ) -> Result<CapabilitySchema, EngineError>;
}

/// The main completion engine. Treated as a black box.
#[async_trait]
pub trait CompletionEngine: Send + Sync + 'static {
    /// Complete the conversation, optionally with a capability schema attached.
    ///
    /// # Returns
    ///
    /// - `Ok(Completion)` with the text and any requested invocations
    /// - `Err(EngineError::*)` on transport or upstream failure
    async fn complete(
        &self,
        messages: &[Message],
        capabilities: Option<&CapabilitySchema>,
    ) -> Result<Completion, EngineError>;
}

/// Runs capability invocations requested by the completion engine.
#[async_trait]
pub trait CapabilityExecutor: Send + Sync + 'static {
    /// Execute one invocation and return its raw result payload.
    async fn execute(
        &self,
        request: &InvocationRequest,
    ) -> Result<serde_json::Value, EngineError>;
}

/// Prompt pair for the auxiliary (classification) inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryPrompt {
    pub system: String,
    pub user: String,
}

/// Fast, cheap inference used by the intent classifier.
///
/// Returns the raw model text; the classifier owns parsing and validation.
#[async_trait]
pub trait AuxiliaryInference: Send + Sync + 'static {
    async fn infer(&self, prompt: &AuxiliaryPrompt) -> Result<String, EngineError>;
}
