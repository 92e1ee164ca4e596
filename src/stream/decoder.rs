//! JSON-Lines event decoder
//!
//! Parses the agent CLI's stream-json output into typed [`StreamEvent`]s
//! with cross-chunk buffering. Each complete line is probed as a JSON
//! object; classification keys off the `type`/`subtype` fields and a
//! best-effort text fragment is extracted independently of the event kind.
//! Diagnostic lines that are not valid JSON objects are silently skipped
//! because the CLI interleaves them freely.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::StreamEvent;

/// Default step name for tool events without a usable name field
const DEFAULT_TOOL_NAME: &str = "Tool";

/// Step name used for message-level lifecycle events
const THINKING_STEP: &str = "Thinking";

/// Stateful decoder for one batch invocation's output stream
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Partial line carried across chunk boundaries
    buffer: String,
    /// All text fragments collected so far
    collected: String,
    /// Most recent explicit error message, kept as the failure reason
    last_error: Option<String>,
}

impl StreamDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of stream text; returns the events decoded from the
    /// complete lines it contained.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            self.decode_line(line.trim_end_matches('\n'), &mut events);
        }
        events
    }

    /// Text collected from all fragments so far
    pub fn collected_text(&self) -> &str {
        &self.collected
    }

    /// The recorded failure reason, if an error event was seen
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Flush any residual partial line and resolve the invocation.
    ///
    /// Returns the events produced by the residual content plus a terminal
    /// `Completed`/`Failed` event, and the overall result: the full collected
    /// text on exit code 0, otherwise a [`Error::BatchFailed`] carrying the
    /// recorded error message or a generic exit-code message.
    pub fn finish(mut self, exit_code: i32) -> (Vec<StreamEvent>, Result<String>) {
        let mut events = Vec::new();
        let residual = std::mem::take(&mut self.buffer);
        if !residual.trim().is_empty() {
            self.decode_line(&residual, &mut events);
        }

        if exit_code == 0 {
            events.push(StreamEvent::Completed(self.collected.clone()));
            (events, Ok(self.collected))
        } else {
            let message = self
                .last_error
                .unwrap_or_else(|| format!("exited with code {}", exit_code));
            events.push(StreamEvent::Failed(message.clone()));
            (events, Err(Error::BatchFailed { message }))
        }
    }

    fn decode_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        // Malformed or non-object lines are diagnostics, not protocol
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(trimmed) else {
            trace!("skipping non-JSON stream line: {}", trimmed);
            return;
        };
        let value = Value::Object(object);

        if let Some(event) = classify(&value) {
            if let StreamEvent::Failed(message) = &event {
                self.last_error = Some(message.clone());
            }
            events.push(event);
        }

        if let Some(text) = extract_text(&value) {
            if !text.is_empty() {
                self.collected.push_str(&text);
                events.push(StreamEvent::TextDelta(text));
            }
        }
    }
}

/// Classify a decoded object by its `type`/`subtype` fields
fn classify(value: &Value) -> Option<StreamEvent> {
    let event_type = lowercase_field(value, "type");
    let subtype = lowercase_field(value, "subtype");

    if event_type == "error" {
        let message = string_field(value, "message")
            .or_else(|| string_field(value, "error"))
            .unwrap_or_else(|| "unknown error".to_string());
        return Some(StreamEvent::Failed(message));
    }

    if event_type.contains("tool_use") || subtype.contains("tool_use") {
        return Some(StreamEvent::ToolStarted(tool_name(value)));
    }

    if event_type.contains("tool_result") || subtype.contains("tool_result") {
        let is_error = value
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let name = tool_name(value);
        return Some(if is_error {
            StreamEvent::ToolFailed(name)
        } else {
            StreamEvent::ToolSucceeded(name)
        });
    }

    if event_type == "message_start" {
        return Some(StreamEvent::ToolStarted(THINKING_STEP.to_string()));
    }

    if event_type == "message_stop" || event_type == "result" {
        return Some(StreamEvent::ToolSucceeded(THINKING_STEP.to_string()));
    }

    None
}

/// Best-effort text fragment extraction, independent of classification
fn extract_text(value: &Value) -> Option<String> {
    if let Some(text) = string_field(value, "text") {
        return Some(text);
    }

    if let Some(text) = value
        .get("delta")
        .and_then(|delta| delta.get("text"))
        .and_then(Value::as_str)
    {
        return Some(text.to_string());
    }

    if let Some(content) = value
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_array)
    {
        let joined: String = content
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect();
        return Some(joined);
    }

    string_field(value, "result")
}

fn tool_name(value: &Value) -> String {
    string_field(value, "tool_name")
        .or_else(|| string_field(value, "name"))
        .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string())
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn lowercase_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .unwrap_or_default()
}
