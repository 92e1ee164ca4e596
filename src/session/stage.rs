//! Stage transition rules
//!
//! The session stage is driven by case-insensitive substring matches against
//! each normalized output line. The rules live in one ordered table so the
//! precedence is auditable: trust-prompt and login signals outrank the
//! generic ready signals, and the first matching rule wins. "logged in" is a
//! substring of "not logged in", which is why the login rule sits above the
//! ready rule.

use crate::models::SessionStage;

/// Guard restricting when a rule may fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    Always,
    /// Skip while the agent CLI is already running
    NotRunning,
}

#[derive(Debug)]
struct StageRule {
    triggers: Vec<String>,
    target: SessionStage,
    guard: Guard,
}

/// Ordered stage transition table for one agent CLI
#[derive(Debug)]
pub struct StageRules {
    rules: Vec<StageRule>,
}

impl StageRules {
    /// Build the rule table for `agent_command` (`claude` by default)
    pub fn new(agent_command: &str) -> Self {
        let agent = agent_command.to_lowercase();
        let rules = vec![
            StageRule {
                triggers: vec![
                    "quick safety check".to_string(),
                    "enter to confirm".to_string(),
                ],
                target: SessionStage::TrustPrompt,
                guard: Guard::Always,
            },
            StageRule {
                triggers: vec![
                    "not logged in".to_string(),
                    "login required".to_string(),
                    format!("run `{} login`", agent),
                ],
                target: SessionStage::LoginRequired,
                guard: Guard::NotRunning,
            },
            StageRule {
                triggers: vec![
                    "logged in".to_string(),
                    "authentication successful".to_string(),
                    "successfully authenticated".to_string(),
                    "successfully logged in".to_string(),
                ],
                target: SessionStage::ReadyToLaunch,
                guard: Guard::NotRunning,
            },
            StageRule {
                triggers: vec![
                    "accessing workspace".to_string(),
                    format!("{} code", agent),
                ],
                target: SessionStage::Running,
                guard: Guard::Always,
            },
        ];
        Self { rules }
    }

    /// Evaluate one normalized line against the table.
    ///
    /// Returns the new stage when a rule fires, `None` otherwise. Each line
    /// is evaluated independently; the caller applies the result.
    pub fn evaluate(&self, line: &str, current: SessionStage) -> Option<SessionStage> {
        let haystack = line.to_lowercase();
        for rule in &self.rules {
            if rule.guard == Guard::NotRunning && current == SessionStage::Running {
                continue;
            }
            if rule
                .triggers
                .iter()
                .any(|trigger| haystack.contains(trigger.as_str()))
            {
                return Some(rule.target);
            }
        }
        None
    }
}
