//! Tool-call reconstruction from a transcript event stream.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tool_eval::{ActualToolCall, Parameters, RuntimeType};

use crate::error::TranscriptError;
use crate::event::TranscriptEvent;

const SECTION_RULE: &str = "------------------------------";

/// Tool calls recovered from a transcript, plus its readable rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Calls in emission order.
    pub tool_calls: Vec<ActualToolCall>,
    /// Every event rendered as a titled section.
    pub raw: String,
}

impl Transcript {
    /// Returns the names of the called tools, in order.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_calls.iter().map(ActualToolCall::tool_name).collect()
    }
}

struct PendingCall {
    tool_name: String,
    parameters: Parameters,
}

impl PendingCall {
    fn into_call(self, response: Option<Value>) -> ActualToolCall {
        let call = ActualToolCall::new(self.tool_name).with_parameters(self.parameters);
        match response {
            Some(response) => call.with_response(response),
            None => call,
        }
    }
}

/// Walks `events` once, pairing each tool call with the return that follows it.
///
/// A call superseded by another call before its return is kept without a
/// response, as is a call still open at the end of the stream.
///
/// # Errors
///
/// - [`TranscriptError::ReturnWithoutCall`] for a return with no open call
/// - [`TranscriptError::InvalidArguments`] for arguments that are not an object
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tool_eval_transcript::{TranscriptEvent, reconstruct};
///
/// let events = vec![
///     TranscriptEvent::tool_call("forecast", json!({"city": "Oslo"})),
///     TranscriptEvent::tool_return("forecast", json!({"temp": 4})),
///     TranscriptEvent::text("It is 4 degrees in Oslo."),
/// ];
///
/// let transcript = reconstruct(&events).unwrap();
/// assert_eq!(transcript.tool_names(), vec!["forecast"]);
/// assert_eq!(transcript.tool_calls[0].response(), Some(&json!({"temp": 4})));
/// assert!(transcript.raw.contains("RESPONSE TEXT"));
/// ```
pub fn reconstruct(events: &[TranscriptEvent]) -> Result<Transcript, TranscriptError> {
    let mut tool_calls = Vec::new();
    let mut raw = String::new();
    let mut pending: Option<PendingCall> = None;

    for event in events {
        render_section(&mut raw, event);

        match event {
            TranscriptEvent::ToolCall {
                tool_name, args, ..
            } => {
                let parameters = parse_arguments(tool_name, args)?;
                if let Some(previous) = pending.take() {
                    tracing::warn!(
                        previous_tool = %previous.tool_name,
                        new_tool = %tool_name,
                        "Tool call without a return, completing previous call"
                    );
                    tool_calls.push(previous.into_call(None));
                }
                pending = Some(PendingCall {
                    tool_name: tool_name.clone(),
                    parameters,
                });
            }
            TranscriptEvent::ToolReturn {
                tool_name, content, ..
            } => {
                let call = pending
                    .take()
                    .ok_or_else(|| TranscriptError::ReturnWithoutCall {
                        tool_name: tool_name.clone(),
                    })?;
                tool_calls.push(call.into_call(Some(content.clone())));
            }
            _ => {}
        }
    }

    if let Some(open) = pending {
        tracing::debug!(tool = %open.tool_name, "Transcript ended with an open tool call");
        tool_calls.push(open.into_call(None));
    }

    Ok(Transcript { tool_calls, raw })
}

fn render_section(out: &mut String, event: &TranscriptEvent) {
    let timestamp = event
        .timestamp()
        .map_or_else(|| "N/A".to_string(), chrono::DateTime::to_rfc3339);
    // Writing to a String cannot fail
    let _ = write!(
        out,
        "\n{SECTION_RULE} {} {SECTION_RULE}\n\nTimestamp: {timestamp}\n{}\n",
        event.title(),
        event.body()
    );
}

fn parse_arguments(tool_name: &str, args: &Value) -> Result<Parameters, TranscriptError> {
    let invalid = |reason: String| TranscriptError::InvalidArguments {
        tool_name: tool_name.to_string(),
        reason,
    };

    match args {
        Value::Null => Ok(Parameters::new()),
        Value::Object(map) => Ok(map.clone()),
        Value::String(encoded) if encoded.trim().is_empty() => Ok(Parameters::new()),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(invalid(format!("decoded to {}", RuntimeType::of(&other)))),
            Err(e) => Err(invalid(e.to_string())),
        },
        other => Err(invalid(format!("found {}", RuntimeType::of(other)))),
    }
}
