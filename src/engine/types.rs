//! Supporting types exchanged with the completion and capability collaborators.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Conversation role of a message sent to the completion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Result of a capability invocation fed back to the engine.
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One message of the conversation handed to the completion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Invocations requested by an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<InvocationRequest>,
    /// For `Role::Tool` messages, the invocation this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, invocations: Vec<InvocationRequest>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            invocations,
            invocation_id: None,
        }
    }

    /// Tool message carrying the result (or failure) of one invocation.
    pub fn tool_result(result: &InvocationResult) -> Self {
        Self {
            role: Role::Tool,
            content: result.render(),
            invocations: Vec::new(),
            invocation_id: Some(result.invocation_id.clone()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            invocations: Vec::new(),
            invocation_id: None,
        }
    }
}

/// Opaque handle identifying which capability catalog applies to a request.
///
/// The pipeline only passes it through to the catalog resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogRef(pub String);

impl CatalogRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

/// A single capability (tool/function) the completion engine may invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema of the invocation arguments.
    #[serde(default = "empty_object_schema")]
    pub parameters: serde_json::Value,
}

impl CapabilityDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: empty_object_schema(),
        }
    }
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// The capability set attached to a completion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySchema {
    pub capabilities: Vec<CapabilityDefinition>,
}

impl CapabilitySchema {
    pub fn new(capabilities: Vec<CapabilityDefinition>) -> Self {
        Self { capabilities }
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Capability names in catalog order.
    pub fn names(&self) -> Vec<String> {
        self.capabilities.iter().map(|c| c.name.clone()).collect()
    }

    /// Clean up a resolver-provided set before it is attached to a completion.
    ///
    /// Drops unnamed entries, keeps the first of any duplicate names, and
    /// replaces non-object parameter schemas with an empty object schema.
    pub fn normalize(self) -> Self {
        let mut seen = HashSet::new();
        let capabilities = self
            .capabilities
            .into_iter()
            .filter_map(|mut cap| {
                let name = cap.name.trim().to_string();
                if name.is_empty() || !seen.insert(name.clone()) {
                    return None;
                }
                cap.name = name;
                if !cap.parameters.is_object() {
                    cap.parameters = empty_object_schema();
                }
                Some(cap)
            })
            .collect();
        Self { capabilities }
    }

    /// Narrow the set to the named capabilities.
    ///
    /// Returns `None` when no names match, so callers can keep the full set.
    pub fn select(&self, names: &[String]) -> Option<Self> {
        let wanted: HashSet<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        let capabilities: Vec<_> = self
            .capabilities
            .iter()
            .filter(|c| wanted.contains(&c.name.to_lowercase()))
            .cloned()
            .collect();
        if capabilities.is_empty() {
            None
        } else {
            Some(Self { capabilities })
        }
    }
}

/// A capability invocation requested by the completion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Outcome of executing one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success(serde_json::Value),
    Failure(String),
}

/// Result of one invocation, fed back into the final completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub invocation_id: String,
    pub name: String,
    pub outcome: InvocationOutcome,
}

impl InvocationResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Failure(_))
    }

    /// Render the result as tool-message content.
    ///
    /// Failures stay visible to the engine as an `error` object.
    pub fn render(&self) -> String {
        match &self.outcome {
            InvocationOutcome::Success(serde_json::Value::String(s)) => s.clone(),
            InvocationOutcome::Success(value) => value.to_string(),
            InvocationOutcome::Failure(message) => serde_json::json!({
                "error": message,
                "capability": self.name,
            })
            .to_string(),
        }
    }
}

/// Response of one completion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub invocations: Vec<InvocationRequest>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            invocations: Vec::new(),
        }
    }

    pub fn requests_invocations(&self) -> bool {
        !self.invocations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_drops_unnamed_and_duplicates() {
        let schema = CapabilitySchema::new(vec![
            CapabilityDefinition::new("send_email", "first"),
            CapabilityDefinition::new("  ", "blank"),
            CapabilityDefinition::new("send_email", "second"),
            CapabilityDefinition::new(" calendar_lookup ", "trimmed"),
        ])
        .normalize();

        assert_eq!(schema.names(), vec!["send_email", "calendar_lookup"]);
        assert_eq!(schema.capabilities[0].description, "first");
    }

    #[test]
    fn test_normalize_replaces_non_object_parameters() {
        let mut cap = CapabilityDefinition::new("search", "");
        cap.parameters = json!("not a schema");
        let schema = CapabilitySchema::new(vec![cap]).normalize();
        assert!(schema.capabilities[0].parameters.is_object());
    }

    #[test]
    fn test_select_matches_case_insensitively() {
        let schema = CapabilitySchema::new(vec![
            CapabilityDefinition::new("send_email", ""),
            CapabilityDefinition::new("create_event", ""),
        ]);
        let selected = schema.select(&["SEND_EMAIL".to_string()]).unwrap();
        assert_eq!(selected.names(), vec!["send_email"]);
        assert!(schema.select(&["unknown".to_string()]).is_none());
    }

    #[test]
    fn test_failure_renders_as_error_object() {
        let result = InvocationResult {
            invocation_id: "call-1".to_string(),
            name: "send_email".to_string(),
            outcome: InvocationOutcome::Failure("smtp down".to_string()),
        };
        let rendered: serde_json::Value = serde_json::from_str(&result.render()).unwrap();
        assert_eq!(rendered["error"], "smtp down");
        assert_eq!(rendered["capability"], "send_email");
        assert!(result.is_failure());
    }

    #[test]
    fn test_tool_message_links_invocation() {
        let result = InvocationResult {
            invocation_id: "call-7".to_string(),
            name: "lookup".to_string(),
            outcome: InvocationOutcome::Success(json!("42")),
        };
        let msg = Message::tool_result(&result);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.invocation_id.as_deref(), Some("call-7"));
        assert_eq!(msg.content, "42");
    }
}
