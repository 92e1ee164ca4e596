//! Resume session store
//!
//! Bounded, most-recent-first store of resume tokens discovered in terminal
//! output. The store validates token shape with a real UUID parse, keeps one
//! entry per token, and caps the list so discovery during a long session
//! cannot grow without bound. In-memory only; the host application persists
//! entries if it wants to.

use uuid::Uuid;

use crate::models::ResumeSession;

/// Bounded most-recent-first collection of saved resume sessions
#[derive(Debug)]
pub struct ResumeStore {
    sessions: Vec<ResumeSession>,
    capacity: usize,
}

impl ResumeStore {
    /// Create an empty store holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Vec::new(),
            capacity,
        }
    }

    /// Save a token, moving it to the front if already present.
    ///
    /// Returns `false` for tokens that are not well-formed UUIDs. A re-saved
    /// token keeps its existing label unless a new one is supplied.
    pub fn save(&mut self, token: &str, label: Option<String>) -> bool {
        if Uuid::parse_str(token).is_err() {
            debug!("ignoring malformed resume token: {}", token);
            return false;
        }

        let existing_label = self
            .sessions
            .iter()
            .position(|s| s.id == token)
            .and_then(|idx| self.sessions.remove(idx).label);

        self.sessions
            .insert(0, ResumeSession::new(token.to_string(), label.or(existing_label)));
        self.sessions.truncate(self.capacity);
        true
    }

    /// Set or clear the label of a saved token; returns `false` when absent
    pub fn relabel(&mut self, token: &str, label: Option<String>) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == token) {
            Some(session) => {
                session.label = label;
                true
            }
            None => false,
        }
    }

    /// Remove a saved token; returns `false` when absent
    pub fn delete(&mut self, token: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != token);
        self.sessions.len() != before
    }

    /// Remove all saved tokens
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    /// Saved sessions, most recent first
    pub fn sessions(&self) -> &[ResumeSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
