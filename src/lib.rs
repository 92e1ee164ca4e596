//! AgentTerm - an interactive PTY session engine for embedded agent CLIs
//!
//! This library provides the terminal core for desktop shells that embed an
//! AI coding-agent CLI: it spawns a shell attached to a pseudo-terminal,
//! pumps bytes between the embedding layer and the child without blocking,
//! and decodes the raw stream into readable text, discrete command/output
//! records, and a coarse session-stage state machine.
//!
//! ## Features
//!
//! - **PTY lifecycle:** Cross-platform pseudoterminal via `portable-pty`,
//!   with graceful-then-forced termination and leak-free failure paths
//! - **Escape normalization:** ANSI/VT100 CSI, OSC, and control-sequence
//!   stripping that never corrupts UTF-8
//! - **Command records:** Prompt-aware line segmentation into
//!   `(command, output)` history entries
//! - **Structured streaming:** JSON-Lines decoding of the agent CLI's
//!   print-mode event stream (tool use, text deltas, results)
//! - **Stage machine:** Ordered, auditable substring rules tracking
//!   disconnected → login → trust → ready → running
//! - **Resume sessions:** Opportunistic `--resume` token discovery with a
//!   bounded, labelable store
//! - **Configuration:** TOML-based configuration with safe defaults
//!
//! ## Module Organization
//!
//! - [`config`] - Session configuration loading and validation
//! - [`session`] - The `Session` aggregate, stage rules, batch runner
//! - [`pty`] - PTY spawn, read/wait loops, writes, termination
//! - [`term`] - UTF-8 carry, escape normalizer, line segmenter
//! - [`stream`] - JSON-Lines stream event decoder
//! - [`models`] - Data structures (TerminalEntry, StreamEvent, SessionStage)
//! - [`mod@error`] - Error types and Result alias
//!
//! ## Quick Start
//!
//! ```no_run
//! use agentterm::{Session, SessionConfig};
//!
//! # fn main() -> agentterm::Result<()> {
//! let mut session = Session::new(SessionConfig::load_or_default())?;
//! session.set_workspace("/path/to/project");
//! session.connect()?;
//!
//! // Periodically drain PTY output into observable events
//! for event in session.pump()? {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! AgentTerm uses a message-passing threading model:
//!
//! - **Caller's context:** Owns the `Session`; all state mutation happens in
//!   `pump()`
//! - **PTY reader thread:** Blocking reads, forwarded as chunk messages
//! - **PTY wait thread:** Blocking child reap, forwarded as an exit message
//!
//! Messages are tagged with a per-connect identity token, so callbacks from
//! a superseded connect attempt can never corrupt current state.
//!
//! ## Safety and Reliability
//!
//! - **No panics:** All fallible operations return `Result`
//! - **Bounded memory:** Entry history and resume store are capped
//! - **Graceful degradation:** Malformed config, noisy terminal output, and
//!   malformed stream lines all fall back rather than fail
//! - **Hard connect timeout:** A hung shell is force-terminated, never leaked

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod models;
pub mod pty;
pub mod session;
pub mod stream;
pub mod term;

// Re-exports for core functionality
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use session::{run_batch, ResumeStore, Session, SessionEvent, StageRules};

// Convenience re-exports for common types
pub use models::{
    EntrySource, PendingAction, ResumeSession, SessionStage, StreamEvent, TerminalEntry,
};
pub use pty::PtyHandle;
pub use stream::StreamDecoder;
pub use term::{normalize, LineSegmenter};

// Version information
/// The current version of AgentTerm from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The library name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The library description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize compact tracing output for embedding applications
///
/// Honors `RUST_LOG` when set, defaulting to `info`. Safe to call more than
/// once; later calls are no-ops.
pub fn init_logging() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .compact()
        .try_init();
}

/// Initialize a session with configuration from the default location
///
/// Loads `config.toml` from the platform configuration directory (falling
/// back to defaults when missing or malformed), verifies the configured
/// shell exists, and returns a disconnected [`Session`].
///
/// # Errors
///
/// Returns an error if the configured shell executable does not exist or if
/// the session's internal patterns fail to compile.
pub fn init() -> Result<Session> {
    info!("initializing {} v{}", NAME, VERSION);
    let config = SessionConfig::load_or_default();
    if !std::path::Path::new(&config.shell).exists() {
        return Err(Error::SpawnFailed {
            command: config.shell.clone(),
            reason: "shell executable not found".to_string(),
        });
    }
    Session::new(config)
}
