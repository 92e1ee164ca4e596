//! Line segmentation and command/output extraction
//!
//! Reassembles the normalized text stream into complete lines across chunk
//! boundaries, classifies each line as a shell prompt (carrying a command
//! echo) or as program output, and emits completed command/output records.
//! Every line is additionally scanned for agent resume tokens, which often
//! appear embedded in help text or logs rather than on prompt lines.

use regex::Regex;

use crate::error::Result;
use crate::models::{EntrySource, TerminalEntry};

/// Prompt marker used by the agent-aware shell themes (powerline-style)
pub const PROMPT_MARKER: char = '❯';

/// Unicode no-break space variants trimmed alongside ASCII whitespace
const EXTENDED_WHITESPACE: &[char] = &[
    ' ', '\t', '\r', '\n', '\u{00A0}', '\u{2007}', '\u{202F}',
];

/// Substitute output for a command that produced none
pub const NO_OUTPUT: &str = "(no output)";

/// Everything produced by one [`LineSegmenter::feed`] call
#[derive(Debug, Default)]
pub struct SegmenterOutput {
    /// Command/output records finalized by this chunk
    pub entries: Vec<TerminalEntry>,
    /// Resume tokens discovered on any line of this chunk
    pub resume_tokens: Vec<String>,
    /// The complete lines processed, post-trim (for stage-rule evaluation)
    pub lines: Vec<String>,
}

/// Cross-chunk line segmenter and command/output extractor
#[derive(Debug)]
pub struct LineSegmenter {
    /// Trailing, possibly-incomplete line carried to the next chunk
    carry: String,
    /// Command observed on the most recent prompt line, if any
    current_command: Option<String>,
    /// Output lines accumulated for the open record
    current_output: Vec<String>,
    /// Pattern extracting `<agent> --resume <uuid>` tokens
    resume_pattern: Regex,
}

impl LineSegmenter {
    /// Create a segmenter that recognizes resume invocations of `agent_command`
    pub fn new(agent_command: &str) -> Result<Self> {
        let resume_pattern = Regex::new(&format!(
            r"{}\s+--resume\s+([0-9a-fA-F-]+)",
            regex::escape(agent_command)
        ))?;
        Ok(Self {
            carry: String::new(),
            current_command: None,
            current_output: Vec::new(),
            resume_pattern,
        })
    }

    /// Feed a chunk of normalized text. Returns the records finalized by
    /// this chunk, discovered resume tokens, and the complete lines seen.
    ///
    /// Chunking is transparent: feeding the same text in any split yields
    /// the same sequence of records as feeding it whole.
    pub fn feed(&mut self, text: &str) -> SegmenterOutput {
        let mut out = SegmenterOutput::default();

        self.carry.push_str(text);
        let buffered = std::mem::take(&mut self.carry);
        let normalized = buffered.replace("\r\n", "\n");

        let terminated = normalized.ends_with('\n');
        let mut segments: Vec<&str> = normalized.split('\n').collect();
        if terminated {
            // split() yields a trailing empty segment after the final LF
            segments.pop();
        } else if let Some(last) = segments.pop() {
            self.carry = last.to_string();
        }

        for segment in segments {
            self.consume_line(segment, &mut out);
        }
        out
    }

    /// Finalize the open record, if any (disconnect or child exit)
    pub fn flush(&mut self) -> Option<TerminalEntry> {
        self.carry.clear();
        self.finalize_open()
    }

    /// Drop all buffered partial state without emitting
    pub fn reset(&mut self) {
        self.carry.clear();
        self.current_command = None;
        self.current_output.clear();
    }

    fn consume_line(&mut self, line: &str, out: &mut SegmenterOutput) {
        let trimmed = line.trim_matches(EXTENDED_WHITESPACE);
        if trimmed.is_empty() {
            return;
        }

        // Tokens appear inside multi-line output too, so scan unconditionally
        if let Some(token) = self.extract_resume_token(trimmed) {
            out.resume_tokens.push(token);
        }

        if let Some(command) = extract_prompt_command(trimmed) {
            if let Some(entry) = self.finalize_open() {
                out.entries.push(entry);
            }
            if !command.is_empty() {
                self.current_command = Some(command);
            }
        } else {
            self.current_output.push(trimmed.to_string());
        }

        out.lines.push(trimmed.to_string());
    }

    fn finalize_open(&mut self) -> Option<TerminalEntry> {
        let output = self.current_output.join("\n").trim().to_string();
        self.current_output.clear();
        let command = self.current_command.take()?;
        if command.is_empty() {
            return None;
        }

        let final_output = if output.is_empty() {
            NO_OUTPUT.to_string()
        } else {
            output
        };
        let lower = final_output.to_lowercase();
        let is_error =
            lower.contains("error") || lower.contains("not found") || lower.contains("failed");
        Some(TerminalEntry::new(
            command,
            final_output,
            is_error,
            EntrySource::Terminal,
        ))
    }

    fn extract_resume_token(&self, line: &str) -> Option<String> {
        let captures = self.resume_pattern.captures(line)?;
        let token = captures.get(1)?.as_str();
        // UUID-shaped only: exactly 36 hex-and-dash characters
        if token.len() == 36 {
            Some(token.to_string())
        } else {
            None
        }
    }
}

/// Extract the command echo from a recognized shell prompt line.
///
/// Recognizes a leading prompt marker, a zsh-style `... % command` tail, and
/// plain `$ `/`# ` prefixes. Returns `None` for non-prompt lines; returns an
/// empty string for a bare prompt with no command yet.
fn extract_prompt_command(trimmed: &str) -> Option<String> {
    if let Some(rest) = trimmed.strip_prefix(PROMPT_MARKER) {
        return Some(rest.trim_matches(EXTENDED_WHITESPACE).to_string());
    }

    if let Some(idx) = trimmed.rfind(" % ") {
        return Some(
            trimmed[idx + 3..]
                .trim_matches(EXTENDED_WHITESPACE)
                .to_string(),
        );
    }
    if trimmed.ends_with(" %") || trimmed == "%" {
        // Bare prompt, no command typed yet
        return Some(String::new());
    }
    if let Some(rest) = trimmed.strip_prefix("% ") {
        return Some(rest.trim_matches(EXTENDED_WHITESPACE).to_string());
    }

    if let Some(rest) = trimmed
        .strip_prefix("$ ")
        .or_else(|| trimmed.strip_prefix("# "))
    {
        return Some(rest.trim_matches(EXTENDED_WHITESPACE).to_string());
    }
    if trimmed == "$" || trimmed == "#" {
        return Some(String::new());
    }

    None
}
