//! Terminal Entry Model
//!
//! Represents one observed command and the output that followed it, as
//! reconstructed from the interactive PTY stream or produced by a batch
//! invocation.
//!
//! ## Security Note
//!
//! `TerminalEntry` implements `Serialize` for internal use (testing,
//! debugging), but should never be persisted to disk as-is. Entries may
//! contain sensitive command output.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a terminal entry was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EntrySource {
    /// Reconstructed from the interactive PTY stream
    #[default]
    Terminal,
    /// Produced by a batch (print-mode) invocation of the agent CLI
    ProtocolBatch,
}

/// A single observed command and its complete output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalEntry {
    /// Unique identifier for the entry
    pub id: String,

    /// The command text as observed on a prompt line
    pub command: String,

    /// Accumulated output, newline joined; `"(no output)"` when empty
    pub output: String,

    /// Whether the output looks like a failure
    pub is_error: bool,

    /// Origin of the entry
    pub source: EntrySource,

    /// When the entry was finalized (local time)
    pub timestamp: DateTime<Local>,
}

impl TerminalEntry {
    /// Create a new terminal entry
    pub fn new(command: String, output: String, is_error: bool, source: EntrySource) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            command,
            output,
            is_error,
            source,
            timestamp: Local::now(),
        }
    }
}
