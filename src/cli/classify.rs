//! Classify command implementation

use crate::cache::ClassificationCache;
use crate::classifier::IntentClassifier;
use crate::cli::output::{format_decision_json, format_decision_table};
use crate::cli::{load_config, ClassifyArgs};
use crate::engine::OpenAiCompatClient;
use std::sync::Arc;
use std::time::Duration;

/// Handle `nexus-gate classify` command
///
/// An unreachable endpoint is not an error: the classifier falls back to its
/// fail-safe decision and that is what gets printed.
pub async fn handle_classify(args: &ClassifyArgs) -> anyhow::Result<String> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(url) = &args.url {
        config.inference.base_url = url.clone();
    }

    let client = Arc::new(reqwest::Client::new());
    let inference = OpenAiCompatClient::new(
        config.inference.base_url.clone(),
        config.inference.classifier_model.clone(),
        client,
        Duration::from_millis(config.classifier.timeout_ms),
    )
    .with_api_key(config.inference.api_key());

    let cache = Arc::new(ClassificationCache::from_config(&config.cache));
    let classifier = IntentClassifier::new(Arc::new(inference), cache, config.classifier.clone());

    tracing::debug!(
        agent_id = %args.agent,
        url = %config.inference.base_url,
        model = %config.inference.classifier_model,
        "Classifying message"
    );
    let decision = classifier.classify(&args.text, &args.agent).await;

    if args.json {
        Ok(format_decision_json(&args.agent, &decision)?)
    } else {
        Ok(format_decision_table(&args.agent, &decision))
    }
}
