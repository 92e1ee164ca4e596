//! Streaming Event Model
//!
//! Typed events decoded from the agent CLI's newline-delimited JSON
//! sub-protocol (print mode with structured streaming output). Events are
//! one-shot values produced per decoded line and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// A decoded event from the JSON-Lines stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A tool invocation (or a thinking phase) started
    ToolStarted(String),
    /// A tool invocation completed successfully
    ToolSucceeded(String),
    /// A tool invocation reported an error result
    ToolFailed(String),
    /// A fragment of response text arrived
    TextDelta(String),
    /// The invocation finished; carries the full collected text
    Completed(String),
    /// The invocation failed; carries the recorded error message
    Failed(String),
}

impl StreamEvent {
    /// The step name for tool events, if any
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            StreamEvent::ToolStarted(name)
            | StreamEvent::ToolSucceeded(name)
            | StreamEvent::ToolFailed(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this event terminates the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Failed(_))
    }
}
