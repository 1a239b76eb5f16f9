//! Output formatting helpers for CLI commands

use crate::classifier::{ClassificationDecision, DecisionSource};
use crate::fallback::FallbackSignal;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// Format a classification decision as a two-column table
pub fn format_decision_table(agent_id: &str, decision: &ClassificationDecision) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);

    let verdict = if decision.requires_capabilities {
        "load capabilities".yellow().to_string()
    } else {
        "skip capabilities".green().to_string()
    };
    let suggested = if decision.suggested_capability_names.is_empty() {
        "-".to_string()
    } else {
        decision.suggested_capability_names.join(", ")
    };

    table.add_row(vec![Cell::new("Agent"), Cell::new(agent_id)]);
    table.add_row(vec![Cell::new("Decision"), Cell::new(verdict)]);
    table.add_row(vec![
        Cell::new("Confidence"),
        Cell::new(decision.confidence.as_str()),
    ]);
    table.add_row(vec![Cell::new("Rationale"), Cell::new(&decision.rationale)]);
    table.add_row(vec![Cell::new("Suggested"), Cell::new(suggested)]);
    table.add_row(vec![
        Cell::new("Source"),
        Cell::new(source_label(decision.source)),
    ]);
    table.add_row(vec![
        Cell::new("Latency"),
        Cell::new(format!("{}ms", decision.elapsed_ms)),
    ]);

    table.to_string()
}

/// Format a classification decision as JSON
pub fn format_decision_json(
    agent_id: &str,
    decision: &ClassificationDecision,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "agent_id": agent_id,
        "decision": decision,
    }))
}

/// Format fallback detection as `trigger`/`no trigger` plus one line per signal
pub fn format_detection_text(signals: &[FallbackSignal]) -> String {
    if signals.is_empty() {
        return "no trigger".to_string();
    }

    let mut out = "trigger".red().bold().to_string();
    for signal in signals {
        out.push_str(&format!("\n  - {}", signal));
    }
    out
}

/// Format fallback detection as JSON
pub fn format_detection_json(signals: &[FallbackSignal]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "trigger": !signals.is_empty(),
        "signals": signals,
    }))
}

/// Short label for a decision source
pub fn source_label(source: DecisionSource) -> &'static str {
    match source {
        DecisionSource::Model => "model",
        DecisionSource::Cache => "cache",
        DecisionSource::FailSafe => "fail-safe",
    }
}
