//! Session configuration
//!
//! TOML-backed configuration for the PTY session engine: which shell to
//! spawn, which agent CLI to drive, and the timing/retry bounds used by
//! the I/O paths. Loading falls back to defaults when the file is missing
//! or malformed, so a bad config never prevents startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default shell when `$SHELL` is unset
pub const FALLBACK_SHELL: &str = "/bin/zsh";

/// Configuration for a [`Session`](crate::session::Session) and its PTY handles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Shell executable used for the interactive session and batch wrapper
    pub shell: String,

    /// Arguments for the interactive shell invocation
    pub shell_args: Vec<String>,

    /// Name of the agent CLI executable (`claude` by default)
    pub agent_command: String,

    /// Milliseconds to wait for the first output of a connect attempt
    pub connect_timeout_ms: u64,

    /// Maximum would-block retries for a single PTY write
    pub write_retry_attempts: u32,

    /// Sleep between would-block write retries, in milliseconds
    pub write_retry_delay_ms: u64,

    /// Grace period before SIGKILL escalation on forced termination, in milliseconds
    pub kill_grace_ms: u64,

    /// Maximum number of terminal entries retained by a session
    pub max_entries: usize,

    /// Maximum number of resume sessions retained by the store
    pub max_resume_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: std::env::var("SHELL").unwrap_or_else(|_| FALLBACK_SHELL.to_string()),
            shell_args: vec!["-i".to_string()],
            agent_command: "claude".to_string(),
            connect_timeout_ms: 8_000,
            write_retry_attempts: 40,
            write_retry_delay_ms: 5,
            kill_grace_ms: 150,
            max_entries: 150,
            max_resume_sessions: 20,
        }
    }
}

/// Validation failures for individual configuration fields
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("shell path must not be empty")]
    EmptyShell,
    #[error("agent command must not be empty")]
    EmptyAgentCommand,
    #[error("connect timeout must be greater than zero")]
    ZeroConnectTimeout,
    #[error("entry limit must be greater than zero")]
    ZeroEntryLimit,
}

impl SessionConfig {
    /// Connect timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// SIGKILL escalation grace period as a [`Duration`]
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    /// Default configuration file location (`<config dir>/agentterm/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agentterm").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: SessionConfig = toml::from_str(&text)?;
        config.validate().map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults on any failure
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                debug!("configuration loaded from {}", path.display());
                config
            }
            Err(e) => {
                warn!("failed to load configuration: {}. Using defaults", e);
                Self::default()
            }
        }
    }

    /// Validate field values
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.shell.trim().is_empty() {
            return Err(ConfigValidationError::EmptyShell);
        }
        if self.agent_command.trim().is_empty() {
            return Err(ConfigValidationError::EmptyAgentCommand);
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigValidationError::ZeroConnectTimeout);
        }
        if self.max_entries == 0 {
            return Err(ConfigValidationError::ZeroEntryLimit);
        }
        Ok(())
    }
}
