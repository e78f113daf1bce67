//! Error types for transcript reconstruction.

use thiserror::Error;

/// Errors that can occur while reconstructing tool calls from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// A tool return arrived with no tool call waiting for it.
    #[error("tool return for '{tool_name}' has no corresponding tool call")]
    ReturnWithoutCall {
        /// Tool named by the orphaned return
        tool_name: String,
    },
    /// Tool call arguments could not be read as a parameter map.
    #[error("arguments of tool call '{tool_name}' are not a JSON object: {reason}")]
    InvalidArguments {
        /// Tool whose arguments were rejected
        tool_name: String,
        /// What was wrong with them
        reason: String,
    },
}
