//! Resume Session Model
//!
//! A saved resume token for the agent CLI, discovered opportunistically in
//! terminal output (`claude --resume <uuid>` invocations) or supplied by the
//! embedding application. Entries are serde-serializable so a host app can
//! persist them; this crate owns no on-disk format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved resume session identifier with an optional user label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSession {
    /// The 36-character UUID token accepted by `--resume`
    pub id: String,
    /// Optional user-assigned label
    pub label: Option<String>,
    /// When the token was last saved
    pub saved_at: DateTime<Utc>,
}

impl ResumeSession {
    /// Create a new resume session saved now
    pub fn new(id: String, label: Option<String>) -> Self {
        Self {
            id,
            label,
            saved_at: Utc::now(),
        }
    }

    /// Display name: the label when present, otherwise the id
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}
