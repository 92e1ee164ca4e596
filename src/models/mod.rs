//! Data models for the session engine
//!
//! Core domain entities: command/output records, decoded stream events,
//! session stages, pending actions, and saved resume sessions.

pub mod resume_session;
pub mod stage;
pub mod stream_event;
pub mod terminal_entry;

pub use resume_session::ResumeSession;
pub use stage::{PendingAction, SessionStage};
pub use stream_event::StreamEvent;
pub use terminal_entry::{EntrySource, TerminalEntry};
