//! Auxiliary prompt construction.

use crate::engine::AuxiliaryPrompt;

/// Instructions for the auxiliary model. The only output is a JSON decision.
pub const SYSTEM_PROMPT: &str = r#"You decide whether a user message requires calling external tools.
Do not answer the message. Reply with a single JSON object and nothing else:

{"requires_capabilities": <true|false>, "confidence": "<high|medium|low>", "rationale": "<one short sentence>", "suggested_capabilities": ["<tool name>", ...]}

requires_capabilities = true when the message asks to:
- create, update, delete or send something (emails, events, records, messages, files)
- look up external or live data (accounts, calendars, documents, prices, status, search)
- perform an operation in a connected integration or service

requires_capabilities = false when the message is:
- a greeting, thanks or small talk
- general conversation or opinion
- a request for an explanation or knowledge the assistant already has
- a confirmation or acknowledgment with no new action

When unsure, choose true with low confidence. Missing a needed tool is worse than loading one that is not used."#;

/// Build the auxiliary prompt for `message`, truncated to `max_chars` characters.
pub fn build_prompt(message: &str, max_chars: usize) -> AuxiliaryPrompt {
    let trimmed = message.trim();
    let text: String = if trimmed.chars().count() > max_chars {
        trimmed.chars().take(max_chars).collect()
    } else {
        trimmed.to_string()
    };

    AuxiliaryPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!("Message:\n{}", text),
    }
}
