//! Error types and Result aliases for agentterm

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for agentterm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for agentterm
#[derive(Debug)]
pub enum Error {
    // === PTY lifecycle errors ===
    /// Failed to allocate the PTY master/slave pair
    PtyAllocationFailed {
        reason: String,
    },

    /// Failed to spawn the child process on the PTY slave
    SpawnFailed {
        command: String,
        reason: String,
    },

    /// Operation attempted on a handle that was never started or is already torn down
    PtyNotStarted,

    /// Write to the PTY master failed for a non-transient reason, or retries were exhausted
    PtyWriteFailed {
        reason: String,
    },

    /// Failed to deliver a signal to the child process
    SignalSendFailed {
        signal: String,
        reason: String,
    },

    // === Session errors ===
    /// No readiness signal arrived within the configured bound; the in-flight
    /// PTY handle has already been force-terminated when this surfaces
    ConnectTimeout {
        timeout: Duration,
    },

    /// A workspace directory must be selected before connecting
    WorkspaceNotSelected,

    /// The agent CLI executable could not be located
    AgentNotFound {
        command: String,
    },

    /// A batch (print-mode) invocation failed; carries the captured error
    /// message, or the generic exit-code message when none was recorded
    BatchFailed {
        message: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PtyAllocationFailed { reason } => {
                write!(f, "Failed to allocate PTY: {}", reason)
            }
            Error::SpawnFailed { command, reason } => {
                write!(f, "Failed to spawn '{}': {}", command, reason)
            }
            Error::PtyNotStarted => {
                write!(f, "PTY handle is not started")
            }
            Error::PtyWriteFailed { reason } => {
                write!(f, "Failed to write to PTY: {}", reason)
            }
            Error::SignalSendFailed { signal, reason } => {
                write!(f, "Failed to send signal '{}': {}", signal, reason)
            }
            Error::ConnectTimeout { timeout } => {
                write!(f, "Connection attempt timed out after {:?}", timeout)
            }
            Error::WorkspaceNotSelected => {
                write!(f, "Workspace directory is not selected")
            }
            Error::AgentNotFound { command } => {
                write!(
                    f,
                    "'{}' command not found. Install the agent CLI or ensure PATH includes it",
                    command
                )
            }
            Error::BatchFailed { message } => {
                write!(f, "Batch invocation failed: {}", message)
            }
            Error::ConfigLoadFailed { path, reason } => {
                write!(
                    f,
                    "Failed to load config from '{}': {}",
                    path.display(),
                    reason
                )
            }
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
