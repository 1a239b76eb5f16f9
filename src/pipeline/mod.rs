//! # Pipeline Orchestrator
//!
//! Sequences classification, conditional capability loading, the main
//! completion, capability execution and the one-shot fallback retry.
//!
//! ```text
//! CLASSIFY ─┬─ skip ──▶ complete (no schema) ─┬─ no trigger ─▶ DONE
//!           │                                 └─ trigger ────▶ LOAD ─▶ CAP_COMPLETE ─▶ DONE
//!           └─ load ──▶ LOAD ─▶ CAP_COMPLETE ─▶ DONE
//!
//! CAP_COMPLETE: complete (schema) ─▶ [execute invocations ─▶ complete again]
//! ```
//!
//! Bounds: at most one fallback retry and one execution round-trip per
//! request. The catalog resolver is never called on the skip path unless the
//! fallback fires. Every external call carries a deadline and observes the
//! caller's cancellation token; no lock is held across any of them.

pub mod error;
pub mod types;

pub use error::{PipelineError, Stage};
pub use types::{PipelineOutcome, PipelinePath, PipelineRequest, StageTimings};

use crate::classifier::{ClassificationDecision, IntentClassifier};
use crate::config::PipelineConfig;
use crate::engine::{
    CapabilityCatalogResolver, CapabilityExecutor, CapabilitySchema, Completion, CompletionEngine,
    InvocationOutcome, InvocationRequest, InvocationResult, Message,
};
use crate::fallback::{FallbackDetector, PhraseFallbackDetector};
use crate::logging::message_preview;
use crate::metrics::MetricsCollector;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// External systems the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn CapabilityCatalogResolver>,
    pub engine: Arc<dyn CompletionEngine>,
    pub executor: Arc<dyn CapabilityExecutor>,
}

/// Per-request state machine driver. Cheap to share behind an `Arc`.
pub struct Orchestrator {
    classifier: Arc<IntentClassifier>,
    resolver: Arc<dyn CapabilityCatalogResolver>,
    engine: Arc<dyn CompletionEngine>,
    executor: Arc<dyn CapabilityExecutor>,
    detector: Arc<dyn FallbackDetector>,
    metrics: Arc<MetricsCollector>,
    config: PipelineConfig,
    fallback_enabled: bool,
    content_logging: bool,
}

/// Mutable bookkeeping for one request.
struct Run<'a> {
    request: &'a PipelineRequest,
    cancel: &'a CancellationToken,
    started: Instant,
    timings: StageTimings,
    invocations: Vec<InvocationResult>,
}

impl<'a> Run<'a> {
    fn finish(
        self,
        response: String,
        decision: ClassificationDecision,
        path: PipelinePath,
    ) -> PipelineOutcome {
        let mut timings = self.timings;
        timings.total_ms = self.started.elapsed().as_millis() as u64;
        PipelineOutcome {
            request_id: self.request.request_id.clone(),
            agent_id: self.request.agent_id.clone(),
            response,
            decision,
            path,
            capabilities_loaded: path != PipelinePath::NoCapabilities,
            capabilities_executed: !self.invocations.is_empty(),
            fallback_triggered: path == PipelinePath::Fallback,
            invocations: self.invocations,
            timings,
            completed_at: chrono::Utc::now(),
        }
    }
}

/// Run `fut` under a deadline, aborting early if `cancel` fires.
async fn bounded<T, F>(
    stage: Stage,
    timeout_ms: u64,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, PipelineError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
        result = tokio::time::timeout(Duration::from_millis(timeout_ms), fut) => {
            result.map_err(|_| PipelineError::Timeout { stage, timeout_ms })
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

impl Orchestrator {
    pub fn new(
        classifier: Arc<IntentClassifier>,
        collaborators: Collaborators,
        metrics: Arc<MetricsCollector>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            classifier,
            resolver: collaborators.resolver,
            engine: collaborators.engine,
            executor: collaborators.executor,
            detector: Arc::new(PhraseFallbackDetector::default()),
            metrics,
            config,
            fallback_enabled: true,
            content_logging: false,
        }
    }

    /// Replace the fallback detection strategy.
    pub fn with_detector(mut self, detector: Arc<dyn FallbackDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_fallback_enabled(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Include truncated message previews in debug logs.
    pub fn with_content_logging(mut self, enabled: bool) -> Self {
        self.content_logging = enabled;
        self
    }

    pub fn classifier(&self) -> &Arc<IntentClassifier> {
        &self.classifier
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Handle one request end to end and record its outcome.
    pub async fn handle(
        &self,
        request: &PipelineRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        tracing::debug!(
            request_id = %request.request_id,
            agent_id = %request.agent_id,
            preview = ?message_preview(&request.message_text, self.content_logging),
            "Pipeline request started"
        );

        match self.drive(request, cancel).await {
            Ok(outcome) => {
                self.metrics.record(&outcome);
                tracing::info!(
                    request_id = %outcome.request_id,
                    agent_id = %outcome.agent_id,
                    path = %outcome.path,
                    cache_hit = outcome.cache_hit(),
                    executed = outcome.capabilities_executed,
                    elapsed_ms = outcome.timings.total_ms,
                    "Pipeline request completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.metrics.record_failure(&request.agent_id, &e);
                tracing::warn!(
                    request_id = %request.request_id,
                    agent_id = %request.agent_id,
                    error = %e,
                    "Pipeline request failed"
                );
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        request: &PipelineRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut run = Run {
            request,
            cancel,
            started: Instant::now(),
            timings: StageTimings::default(),
            invocations: Vec::new(),
        };

        let classify_start = Instant::now();
        let decision = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PipelineError::Cancelled { stage: Stage::Classification });
            }
            decision = self.classifier.classify(&request.message_text, &request.agent_id) => decision,
        };
        run.timings.classification_ms = elapsed_ms(classify_start);

        tracing::debug!(
            request_id = %request.request_id,
            requires_capabilities = decision.requires_capabilities,
            confidence = %decision.confidence,
            source = ?decision.source,
            "Classification decided"
        );

        let messages = self.base_messages(request);

        if decision.requires_capabilities {
            let schema = self.load_capabilities(&mut run, Some(&decision)).await?;
            let text = self
                .complete_with_capabilities(&mut run, messages, &schema)
                .await?;
            return Ok(run.finish(text, decision, PipelinePath::Capabilities));
        }

        let completion = self.complete(&mut run, &messages, None).await?;
        if !self.needs_fallback(request, &completion) {
            return Ok(run.finish(completion.text, decision, PipelinePath::NoCapabilities));
        }

        tracing::info!(
            request_id = %request.request_id,
            agent_id = %request.agent_id,
            "Fallback triggered, retrying with capabilities"
        );
        let schema = self.load_capabilities(&mut run, None).await?;
        let text = self
            .complete_with_capabilities(&mut run, messages, &schema)
            .await?;
        Ok(run.finish(text, decision, PipelinePath::Fallback))
    }

    fn base_messages(&self, request: &PipelineRequest) -> Vec<Message> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(request.history.iter().cloned());
        messages.push(Message::user(request.message_text.clone()));
        messages
    }

    fn needs_fallback(&self, request: &PipelineRequest, completion: &Completion) -> bool {
        if !self.fallback_enabled {
            return false;
        }
        if completion.requests_invocations() {
            tracing::debug!(
                request_id = %request.request_id,
                requested = completion.invocations.len(),
                "Schema-less completion requested capabilities"
            );
            return true;
        }
        self.detector
            .detect_missed_capability_need(&completion.text, &request.capability_names_hint)
    }

    /// Resolve and normalize the capability set.
    ///
    /// `decision` is only passed on the classified path; the fallback retry
    /// always loads the full set.
    async fn load_capabilities(
        &self,
        run: &mut Run<'_>,
        decision: Option<&ClassificationDecision>,
    ) -> Result<CapabilitySchema, PipelineError> {
        let start = Instant::now();
        let request = run.request;

        let schema = bounded(
            Stage::CatalogResolution,
            self.config.resolve_timeout_ms,
            run.cancel,
            self.resolver
                .resolve(&request.agent_id, &request.session_id, &request.catalog),
        )
        .await?
        .map_err(PipelineError::CatalogResolution)?
        .normalize();

        let schema = match decision {
            Some(d) if self.config.selective_loading && !d.suggested_capability_names.is_empty() => {
                schema
                    .select(&d.suggested_capability_names)
                    .unwrap_or(schema)
            }
            _ => schema,
        };

        run.timings.catalog_ms += elapsed_ms(start);
        tracing::debug!(
            request_id = %request.request_id,
            capabilities = schema.len(),
            "Capability set loaded"
        );
        Ok(schema)
    }

    async fn complete(
        &self,
        run: &mut Run<'_>,
        messages: &[Message],
        schema: Option<&CapabilitySchema>,
    ) -> Result<Completion, PipelineError> {
        let start = Instant::now();
        let completion = bounded(
            Stage::Completion,
            self.config.completion_timeout_ms,
            run.cancel,
            self.engine.complete(messages, schema),
        )
        .await?
        .map_err(PipelineError::Completion)?;
        run.timings.completion_ms += elapsed_ms(start);
        Ok(completion)
    }

    /// Completion with the schema attached, plus at most one execution round-trip.
    async fn complete_with_capabilities(
        &self,
        run: &mut Run<'_>,
        mut messages: Vec<Message>,
        schema: &CapabilitySchema,
    ) -> Result<String, PipelineError> {
        let attached = if schema.is_empty() { None } else { Some(schema) };

        let first = self.complete(run, &messages, attached).await?;
        if !first.requests_invocations() {
            return Ok(first.text);
        }

        let results = self.execute_invocations(run, &first.invocations).await?;
        messages.push(Message::assistant(first.text, first.invocations));
        messages.extend(results.iter().map(Message::tool_result));
        run.invocations.extend(results);

        let second = self.complete(run, &messages, attached).await?;
        if second.requests_invocations() {
            tracing::debug!(
                request_id = %run.request.request_id,
                requested = second.invocations.len(),
                "Ignoring invocations requested after execution round-trip"
            );
        }
        Ok(second.text)
    }

    /// Execute one round of invocations concurrently, preserving request order.
    ///
    /// Executor errors become failed results the engine gets to see; a
    /// deadline or cancellation aborts the whole request.
    async fn execute_invocations(
        &self,
        run: &mut Run<'_>,
        invocations: &[InvocationRequest],
    ) -> Result<Vec<InvocationResult>, PipelineError> {
        let start = Instant::now();
        let timeout_ms = self.config.execution_timeout_ms;
        let cancel = run.cancel;
        let request = run.request;
        let request_id = &request.request_id;

        let calls = invocations.iter().map(|invocation| async move {
            let result = bounded(
                Stage::Execution,
                timeout_ms,
                cancel,
                self.executor.execute(invocation),
            )
            .await?;

            let outcome = match result {
                Ok(value) => InvocationOutcome::Success(value),
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        capability = %invocation.name,
                        error = %e,
                        "Capability invocation failed"
                    );
                    InvocationOutcome::Failure(e.to_string())
                }
            };

            Ok::<_, PipelineError>(InvocationResult {
                invocation_id: invocation.id.clone(),
                name: invocation.name.clone(),
                outcome,
            })
        });

        let results = futures::future::try_join_all(calls).await?;
        run.timings.execution_ms += elapsed_ms(start);
        Ok(results)
    }
}
