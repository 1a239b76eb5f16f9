//! Shared test utilities for gate integration tests.
//!
//! Counting doubles for every collaborator plus a harness that wires them
//! into an [`Orchestrator`].

#![allow(dead_code)]

use async_trait::async_trait;
use nexus_gate::cache::ClassificationCache;
use nexus_gate::classifier::IntentClassifier;
use nexus_gate::config::{ClassifierConfig, PipelineConfig};
use nexus_gate::engine::{
    AuxiliaryInference, AuxiliaryPrompt, CapabilityCatalogResolver, CapabilityDefinition,
    CapabilityExecutor, CapabilitySchema, CatalogRef, Completion, CompletionEngine, EngineError,
    InvocationRequest, Message,
};
use nexus_gate::metrics::MetricsCollector;
use nexus_gate::pipeline::{Collaborators, Orchestrator};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Well-Known Classifier Replies
// =============================================================================

pub const SKIP_REPLY: &str =
    r#"{"requires_capabilities": false, "confidence": "high", "rationale": "small talk"}"#;

pub const LOAD_REPLY: &str = r#"{"requires_capabilities": true, "confidence": "high", "rationale": "sends email", "suggested_capabilities": ["send_email"]}"#;

// =============================================================================
// Capability Builders
// =============================================================================

/// Three capabilities: `send_email`, `calendar_lookup`, `web_search`.
pub fn sample_schema() -> CapabilitySchema {
    CapabilitySchema::new(vec![
        CapabilityDefinition::new("send_email", "Send an email"),
        CapabilityDefinition::new("calendar_lookup", "Look up calendar events"),
        CapabilityDefinition::new("web_search", "Search the web"),
    ])
}

pub fn invocation(id: &str, name: &str, arguments: Value) -> InvocationRequest {
    InvocationRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

/// Completion that requests the given invocations.
pub fn invoking(invocations: Vec<InvocationRequest>) -> Completion {
    Completion {
        text: String::new(),
        invocations,
    }
}

// =============================================================================
// Auxiliary Inference
// =============================================================================

/// Classifier backend returning one fixed reply.
pub struct ScriptedAux {
    reply: Result<String, EngineError>,
    delay: Duration,
    calls: AtomicU32,
}

impl ScriptedAux {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        })
    }

    pub fn failing(err: EngineError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        })
    }

    pub fn slow(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            delay,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuxiliaryInference for ScriptedAux {
    async fn infer(&self, _prompt: &AuxiliaryPrompt) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

// =============================================================================
// Catalog Resolver
// =============================================================================

pub struct CountingResolver {
    result: Result<CapabilitySchema, EngineError>,
    calls: AtomicU32,
    catalogs: Mutex<Vec<CatalogRef>>,
}

impl CountingResolver {
    pub fn returning(schema: CapabilitySchema) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(schema),
            calls: AtomicU32::new(0),
            catalogs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(err: EngineError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(err),
            calls: AtomicU32::new(0),
            catalogs: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn catalogs(&self) -> Vec<CatalogRef> {
        self.catalogs.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityCatalogResolver for CountingResolver {
    async fn resolve(
        &self,
        _agent_id: &str,
        _session_id: &str,
        catalog: &CatalogRef,
    ) -> Result<CapabilitySchema, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.catalogs.lock().unwrap().push(catalog.clone());
        self.result.clone()
    }
}

// =============================================================================
// Completion Engine
// =============================================================================

/// One call as seen by the engine.
#[derive(Debug, Clone)]
pub struct EngineCall {
    pub messages: Vec<Message>,
    pub schema: Option<CapabilitySchema>,
}

/// Engine replaying a script of responses; repeats `Completion::text("done")`
/// once the script runs out.
pub struct ScriptedEngine {
    script: Mutex<VecDeque<Result<Completion, EngineError>>>,
    delay: Duration,
    calls: Mutex<Vec<EngineCall>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Result<Completion, EngineError>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    /// Plain-text replies, in order.
    pub fn texts(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(Completion::text(*r))).collect())
    }

    pub fn with_delay(script: Vec<Result<Completion, EngineError>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionEngine for ScriptedEngine {
    async fn complete(
        &self,
        messages: &[Message],
        capabilities: Option<&CapabilitySchema>,
    ) -> Result<Completion, EngineError> {
        self.calls.lock().unwrap().push(EngineCall {
            messages: messages.to_vec(),
            schema: capabilities.cloned(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Completion::text("done")))
    }
}

// =============================================================================
// Capability Executor
// =============================================================================

/// Executor answering per capability name; unknown names succeed with `{"ok": true}`.
pub struct CountingExecutor {
    results: HashMap<String, Result<Value, EngineError>>,
    delays: HashMap<String, Duration>,
    calls: AtomicU32,
    executed: Mutex<Vec<String>>,
}

impl CountingExecutor {
    pub fn new() -> Arc<Self> {
        Self::build(HashMap::new(), HashMap::new())
    }

    pub fn build(
        results: HashMap<String, Result<Value, EngineError>>,
        delays: HashMap<String, Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            results,
            delays,
            calls: AtomicU32::new(0),
            executed: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_for(name: &str, err: EngineError) -> Arc<Self> {
        Self::build(HashMap::from([(name.to_string(), Err(err))]), HashMap::new())
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Names in completion order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityExecutor for CountingExecutor {
    async fn execute(&self, request: &InvocationRequest) -> Result<Value, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&request.name) {
            tokio::time::sleep(*delay).await;
        }
        self.executed.lock().unwrap().push(request.name.clone());
        self.results
            .get(&request.name)
            .cloned()
            .unwrap_or_else(|| Ok(json!({"ok": true, "capability": request.name})))
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub aux: Arc<ScriptedAux>,
    pub resolver: Arc<CountingResolver>,
    pub engine: Arc<ScriptedEngine>,
    pub executor: Arc<CountingExecutor>,
    pub metrics: Arc<MetricsCollector>,
}

/// Harness with the sample schema, a default executor and default config.
pub fn harness(aux: Arc<ScriptedAux>, engine: Arc<ScriptedEngine>) -> Harness {
    harness_with(
        aux,
        CountingResolver::returning(sample_schema()),
        engine,
        CountingExecutor::new(),
        PipelineConfig::default(),
    )
}

pub fn harness_with(
    aux: Arc<ScriptedAux>,
    resolver: Arc<CountingResolver>,
    engine: Arc<ScriptedEngine>,
    executor: Arc<CountingExecutor>,
    config: PipelineConfig,
) -> Harness {
    let cache = Arc::new(ClassificationCache::new(1000, Duration::from_secs(300)));
    let classifier = Arc::new(IntentClassifier::new(
        aux.clone(),
        cache,
        ClassifierConfig::default(),
    ));
    let metrics = Arc::new(MetricsCollector::new(100));
    let orchestrator = Orchestrator::new(
        classifier,
        Collaborators {
            resolver: resolver.clone(),
            engine: engine.clone(),
            executor: executor.clone(),
        },
        metrics.clone(),
        config,
    );

    Harness {
        orchestrator,
        aux,
        resolver,
        engine,
        executor,
        metrics,
    }
}
