//! Detect command implementation

use crate::cli::output::{format_detection_json, format_detection_text};
use crate::cli::{load_config, DetectArgs};
use crate::fallback::PhraseFallbackDetector;

/// Handle `nexus-gate detect` command
///
/// Runs entirely offline. A trigger is reported in the output, never through
/// the exit status.
pub fn handle_detect(args: &DetectArgs) -> anyhow::Result<String> {
    let config = load_config(args.config.as_deref())?;
    let detector = PhraseFallbackDetector::from_config(&config.fallback);
    let signals = detector.signals(&args.text, &args.capabilities);

    if args.json {
        Ok(format_detection_json(&signals)?)
    } else {
        Ok(format_detection_text(&signals))
    }
}
