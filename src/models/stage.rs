//! Session Stage Model
//!
//! Coarse lifecycle stage of an embedded agent session, plus the pending
//! action that may be queued while disconnected and replayed once the
//! session reaches a connected state.

use serde::{Deserialize, Serialize};

/// Coarse phase of the embedded agent session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionStage {
    /// No shell is running
    #[default]
    Disconnected,
    /// The interactive shell is being spawned
    PreparingShell,
    /// Connected; the agent CLI requires a login
    LoginRequired,
    /// A login flow is in progress
    Authenticating,
    /// The agent is asking for workspace trust confirmation
    TrustPrompt,
    /// Authenticated and ready to launch the agent
    ReadyToLaunch,
    /// The agent CLI is running
    Running,
}

impl SessionStage {
    /// Whether a live shell is expected at this stage
    pub fn is_connected(&self) -> bool {
        !matches!(self, SessionStage::Disconnected)
    }
}

/// An action queued while disconnected and replayed once connected.
/// One slot only; queuing a new action overwrites any unconsumed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    /// Start the browser-based login flow
    BrowserLogin,
    /// Start the API-key login flow
    ApiLogin,
    /// Launch the agent CLI in interactive mode
    EnterInteractive,
}
