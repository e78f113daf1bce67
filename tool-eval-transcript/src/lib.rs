//! Transcript adapter for the tool-eval engine.
//!
//! Models report their work as a stream of conversation parts: prompts,
//! tool calls, tool returns, retries, text. This crate walks that stream and
//! recovers the ordered [`ActualToolCall`](tool_eval::ActualToolCall) list the
//! engine matches against expectations, plus a readable rendering of the
//! whole conversation.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tool_eval::{ExpectedToolCall, MatchStrategy, NoSchemas, ToolCallMatcher, classify_run};
//! use tool_eval_transcript::{TranscriptEvent, reconstruct};
//!
//! let events: Vec<TranscriptEvent> = serde_json::from_value(json!([
//!     {"part_kind": "user-prompt", "content": "What's the weather in Oslo?"},
//!     {"part_kind": "tool-call", "tool_name": "forecast", "args": "{\"city\": \"Oslo\"}"},
//!     {"part_kind": "tool-return", "tool_name": "forecast", "content": {"temp": 4}},
//!     {"part_kind": "text", "content": "It is 4 degrees."}
//! ])).unwrap();
//!
//! let transcript = reconstruct(&events).unwrap();
//! let expected = vec![ExpectedToolCall::new("weather", "forecast").with_parameter("city", json!("oslo"))];
//!
//! let results = ToolCallMatcher::new()
//!     .match_calls(&expected, &transcript.tool_calls, MatchStrategy::OrderIndependent, &NoSchemas)
//!     .unwrap();
//! assert_eq!(classify_run(&results).as_str(), "TP");
//! ```
//!
//! # Pairing Rules
//!
//! | Event | Effect |
//! |-------|--------|
//! | tool call | opens a call; an already-open call is kept without a response |
//! | tool return | closes the open call with the returned content |
//! | tool return, nothing open | [`TranscriptError::ReturnWithoutCall`] |
//! | end of stream | an open call is kept without a response |

#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod event;
mod parser;

pub use error::TranscriptError;
pub use event::TranscriptEvent;
pub use parser::{Transcript, reconstruct};
