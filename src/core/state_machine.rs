//! Per-draft publish state machine
//!
//! Each draft moves through `Attempting -> ConflictRetrying -> {Succeeded, Failed}`
//! or directly from `Attempting` to a terminal state. `ConflictRetrying` is
//! reachable only from `Attempting`, so a draft is retried at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Publishing state of a single draft
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftPublishState {
    Attempting,
    ConflictRetrying,
    Succeeded,
    Failed,
}

impl DraftPublishState {
    fn can_transition_to(self, to: Self) -> bool {
        use DraftPublishState::*;
        matches!(
            (self, to),
            (Attempting, ConflictRetrying)
                | (Attempting, Succeeded)
                | (Attempting, Failed)
                | (ConflictRetrying, Succeeded)
                | (ConflictRetrying, Failed)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid transition {from:?} → {to:?}")]
pub struct InvalidTransition {
    pub from: DraftPublishState,
    pub to: DraftPublishState,
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    pub from: DraftPublishState,
    pub to: DraftPublishState,
    pub timestamp: DateTime<Utc>,
}

/// Tracks one draft's way through a publish attempt
#[derive(Debug, Clone)]
pub struct DraftAttempt {
    path: String,
    current_state: DraftPublishState,
    transitions: Vec<StateTransition>,
    error: Option<String>,
}

impl DraftAttempt {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            current_state: DraftPublishState::Attempting,
            transitions: Vec::new(),
            error: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> DraftPublishState {
        self.current_state
    }

    /// Transition to a new state
    pub fn transition(&mut self, to: DraftPublishState) -> Result<(), InvalidTransition> {
        if !self.current_state.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.current_state,
                to,
            });
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
        });
        self.current_state = to;

        Ok(())
    }

    /// Move to `Failed`, remembering why
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(DraftPublishState::Failed)?;
        self.error = Some(reason.into());
        Ok(())
    }

    pub fn get_last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the conflict retry was used
    pub fn retried(&self) -> bool {
        self.transitions
            .iter()
            .any(|t| t.to == DraftPublishState::ConflictRetrying)
    }

    /// Get transition history as human-readable string
    pub fn get_history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| format!("{}: {:?} → {:?}", t.timestamp.to_rfc3339(), t.from, t.to))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
