//! Transcript events emitted during a model run.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Part kinds with a dedicated variant. Any other `part_kind` becomes
/// [`TranscriptEvent::Unknown`].
const KNOWN_PART_KINDS: [&str; 7] = [
    "system-prompt",
    "user-prompt",
    "tool-call",
    "tool-return",
    "text",
    "retry-prompt",
    "thinking",
];

/// One part of a model conversation.
///
/// Serialized with a `part_kind` tag (`system-prompt`, `tool-call`, ...).
/// A tag outside the known set deserializes to [`TranscriptEvent::Unknown`]
/// carrying that tag, and serializes back under it.
/// Every variant may carry the UTC time it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    /// System instructions given to the model.
    SystemPrompt {
        /// Prompt text
        content: String,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
    /// The user's query.
    UserPrompt {
        /// Prompt text
        content: String,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
    /// The model invoked a tool.
    ToolCall {
        /// Invoked tool
        tool_name: String,
        /// Arguments: an object, a JSON-encoded object, `""` or `null`
        args: Value,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
    /// A tool answered the pending call.
    ToolReturn {
        /// Tool that answered
        tool_name: String,
        /// Returned payload
        content: Value,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
    /// Plain text from the model.
    Text {
        /// Response text
        content: String,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
    /// A retry request sent back to the model after a failed call.
    Retry {
        /// Tool the retry concerns, absent for output validation retries
        tool_name: Option<String>,
        /// Retry message or list of validation errors
        content: Value,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
    /// The model's visible reasoning.
    Thinking {
        /// Reasoning text
        content: String,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
    /// A part this crate does not know.
    Unknown {
        /// The part's `part_kind` tag
        kind: String,
        /// When the part was recorded
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Derived codec for the known part kinds.
#[derive(Serialize, Deserialize)]
#[serde(remote = "TranscriptEvent", tag = "part_kind", rename_all = "kebab-case")]
enum TaggedEvent {
    SystemPrompt {
        content: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    UserPrompt {
        content: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    ToolCall {
        tool_name: String,
        #[serde(default)]
        args: Value,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    ToolReturn {
        tool_name: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Text {
        content: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "retry-prompt")]
    Retry {
        #[serde(default)]
        tool_name: Option<String>,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Thinking {
        content: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(skip)]
    Unknown {
        kind: String,
        timestamp: Option<DateTime<Utc>>,
    },
}

#[derive(Serialize)]
struct UnknownPart<'a> {
    part_kind: &'a str,
    timestamp: Option<&'a DateTime<Utc>>,
}

impl Serialize for TranscriptEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unknown { kind, timestamp } => UnknownPart {
                part_kind: kind,
                timestamp: timestamp.as_ref(),
            }
            .serialize(serializer),
            known => TaggedEvent::serialize(known, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TranscriptEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("part_kind")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("part_kind"))?;

        if KNOWN_PART_KINDS.contains(&kind) {
            return TaggedEvent::deserialize(value).map_err(D::Error::custom);
        }

        // Unreadable timestamps on unknown parts are dropped
        let timestamp = value
            .get("timestamp")
            .and_then(|t| DateTime::<Utc>::deserialize(t).ok());
        Ok(Self::Unknown {
            kind: kind.to_string(),
            timestamp,
        })
    }
}

impl TranscriptEvent {
    /// Creates a tool call event without a timestamp.
    #[must_use]
    pub fn tool_call(tool_name: impl Into<String>, args: Value) -> Self {
        Self::ToolCall {
            tool_name: tool_name.into(),
            args,
            timestamp: None,
        }
    }

    /// Creates a tool return event without a timestamp.
    #[must_use]
    pub fn tool_return(tool_name: impl Into<String>, content: Value) -> Self {
        Self::ToolReturn {
            tool_name: tool_name.into(),
            content,
            timestamp: None,
        }
    }

    /// Creates a text event without a timestamp.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            timestamp: None,
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        match &mut self {
            Self::SystemPrompt { timestamp, .. }
            | Self::UserPrompt { timestamp, .. }
            | Self::ToolCall { timestamp, .. }
            | Self::ToolReturn { timestamp, .. }
            | Self::Text { timestamp, .. }
            | Self::Retry { timestamp, .. }
            | Self::Thinking { timestamp, .. }
            | Self::Unknown { timestamp, .. } => *timestamp = Some(at),
        }
        self
    }

    /// Returns the timestamp, if recorded.
    #[must_use]
    pub const fn timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::SystemPrompt { timestamp, .. }
            | Self::UserPrompt { timestamp, .. }
            | Self::ToolCall { timestamp, .. }
            | Self::ToolReturn { timestamp, .. }
            | Self::Text { timestamp, .. }
            | Self::Retry { timestamp, .. }
            | Self::Thinking { timestamp, .. }
            | Self::Unknown { timestamp, .. } => timestamp.as_ref(),
        }
    }

    /// Section title used in the raw transcript.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::SystemPrompt { .. } => "SYSTEM PROMPT".to_string(),
            Self::UserPrompt { .. } => "USER PROMPT".to_string(),
            Self::ToolCall { tool_name, .. } => format!("TOOL CALL. TOOL: {tool_name}"),
            Self::ToolReturn { tool_name, .. } => format!("TOOL RETURN. TOOL: {tool_name}"),
            Self::Text { .. } => "RESPONSE TEXT".to_string(),
            Self::Retry { tool_name, .. } => format!(
                "TOOL RETRY RETURN. TOOL: {}",
                tool_name.as_deref().unwrap_or("N/A")
            ),
            Self::Thinking { .. } => "THINKING".to_string(),
            Self::Unknown { .. } => "UNIDENTIFIED PART".to_string(),
        }
    }

    /// Body text used in the raw transcript.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::SystemPrompt { content, .. }
            | Self::UserPrompt { content, .. }
            | Self::Text { content, .. }
            | Self::Thinking { content, .. } => content.clone(),
            Self::ToolCall { args: value, .. }
            | Self::ToolReturn { content: value, .. }
            | Self::Retry { content: value, .. } => render_value(value),
            Self::Unknown { kind, .. } => kind.clone(),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn deserializes_tagged_parts() {
        let events: Vec<TranscriptEvent> = serde_json::from_value(json!([
            {"part_kind": "user-prompt", "content": "weather in Oslo?"},
            {"part_kind": "tool-call", "tool_name": "forecast", "args": "{\"city\": \"Oslo\"}",
             "timestamp": "2025-06-01T12:00:00Z"},
            {"part_kind": "retry-prompt", "tool_name": "forecast", "content": "bad city"}
        ]))
        .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[1].title(), "TOOL CALL. TOOL: forecast");
        assert_eq!(
            events[1].timestamp(),
            Some(&Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(events[0].timestamp(), None);
        assert_eq!(events[2].title(), "TOOL RETRY RETURN. TOOL: forecast");
        assert_eq!(events[2].body(), "bad city");
    }

    #[test]
    fn unrecognised_part_kind_becomes_unknown() {
        let events: Vec<TranscriptEvent> = serde_json::from_value(json!([
            {"part_kind": "user-prompt", "content": "search the web"},
            {"part_kind": "builtin-tool-call", "tool_name": "web_search", "args": {},
             "timestamp": "2025-06-01T12:00:00Z"}
        ]))
        .unwrap();

        assert_eq!(
            events[1],
            TranscriptEvent::Unknown {
                kind: "builtin-tool-call".to_string(),
                timestamp: Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
            }
        );
        assert_eq!(events[1].title(), "UNIDENTIFIED PART");
        assert_eq!(events[1].body(), "builtin-tool-call");
    }

    #[test]
    fn unknown_part_keeps_its_tag_when_serialized() {
        let event = TranscriptEvent::Unknown {
            kind: "builtin-tool-return".to_string(),
            timestamp: None,
        };
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["part_kind"], json!("builtin-tool-return"));
        assert_eq!(serde_json::from_value::<TranscriptEvent>(value).unwrap(), event);
    }

    #[test]
    fn known_part_kind_with_bad_fields_is_rejected() {
        let result =
            serde_json::from_value::<TranscriptEvent>(json!({"part_kind": "tool-call", "args": {}}));
        assert!(result.is_err());

        let result = serde_json::from_value::<TranscriptEvent>(json!({"content": "no tag"}));
        assert!(result.is_err());
    }

    #[test]
    fn retry_with_validation_errors_and_no_tool() {
        let event: TranscriptEvent = serde_json::from_value(json!({
            "part_kind": "retry-prompt",
            "tool_name": null,
            "content": [{"loc": ["city"], "msg": "field required"}]
        }))
        .unwrap();

        assert_eq!(
            event,
            TranscriptEvent::Retry {
                tool_name: None,
                content: json!([{"loc": ["city"], "msg": "field required"}]),
                timestamp: None,
            }
        );
        assert_eq!(event.title(), "TOOL RETRY RETURN. TOOL: N/A");
        assert_eq!(event.body(), r#"[{"loc":["city"],"msg":"field required"}]"#);
    }

    #[test]
    fn known_parts_serialize_with_their_tag() {
        let value = serde_json::to_value(TranscriptEvent::tool_call("forecast", json!({}))).unwrap();
        assert_eq!(value["part_kind"], json!("tool-call"));
        assert_eq!(value["tool_name"], json!("forecast"));
    }

    #[test]
    fn body_renders_values() {
        assert_eq!(TranscriptEvent::tool_call("t", Value::Null).body(), "");
        assert_eq!(TranscriptEvent::tool_call("t", json!("raw")).body(), "raw");
        assert_eq!(
            TranscriptEvent::tool_return("t", json!({"ok": true})).body(),
            "{\"ok\":true}"
        );
    }

    #[test]
    fn at_sets_timestamp() {
        let when = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let event = TranscriptEvent::text("hi").at(when);
        assert_eq!(event.timestamp(), Some(&when));
    }
}
