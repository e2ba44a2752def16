//! Error handling for draft publishing
//!
//! This module provides the error types for remote file operations, the local
//! draft store, and batch publishing, using the thiserror crate.

use crate::core::traits::{BatchPublishResult, DraftFailure};
use thiserror::Error;

/// Errors from a remote content store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote API answered with an unexpected status
    #[error("remote API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The supplied version token is stale, or a create hit an existing path
    #[error("version conflict on {path}")]
    VersionConflict { path: String },

    /// No response was received (connection failure, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// The response could not be decoded
    #[error("failed to decode remote response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether this error is the optimistic-concurrency signal
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::VersionConflict { .. } => Some(409),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }
}

/// Errors from the local draft store
#[derive(Error, Debug)]
pub enum DraftStoreError {
    #[error("draft not found: {0}")]
    NotFound(String),

    #[error("invalid draft: {0}")]
    Invalid(String),

    #[error("draft store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("draft store is corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}

/// Main error type for publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    /// The batch was empty; no remote calls were made
    #[error("no drafts to publish")]
    NothingToPublish,

    /// A draft violates the publish preconditions; no remote calls were made
    #[error("draft {draft_id} cannot be published: {reason}")]
    InvalidDraft { draft_id: String, reason: String },

    /// A single remote operation failed outside of a batch
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// One or more drafts failed after the whole batch was processed
    #[error("{}", describe_failures(.failures, .result))]
    AggregateBatchFailure {
        failures: Vec<DraftFailure>,
        result: BatchPublishResult,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("access token is not set ({variable})")]
    TokenMissing { variable: String },

    #[error(transparent)]
    DraftStore(#[from] DraftStoreError),
}

fn describe_failures(failures: &[DraftFailure], result: &BatchPublishResult) -> String {
    let details = failures
        .iter()
        .map(|f| format!("\"{}\" ({})", f.title, f.reason))
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "{} of {} drafts failed to publish: {}",
        failures.len(),
        result.outcomes.len(),
        details
    )
}

impl PublishError {
    /// Check if retrying the same operation later may succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::NothingToPublish
                | Self::InvalidDraft { .. }
                | Self::Config(_)
                | Self::TokenMissing { .. }
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::NothingToPublish => vec!["Create a draft with `draft-publisher draft add`"],
            Self::InvalidDraft { .. } => {
                vec!["Give the draft a non-empty title with `draft-publisher draft edit`"]
            }
            Self::Remote(RemoteError::Network(_)) => vec![
                "Check your network connection",
                "Try again in a moment",
            ],
            Self::Remote(RemoteError::VersionConflict { .. }) => {
                vec!["The file changed remotely; run the command again"]
            }
            Self::Remote(_) => vec![
                "Check that the repository and branch exist",
                "Check that the token can write repository contents",
            ],
            Self::AggregateBatchFailure { .. } => vec![
                "Failed drafts were kept locally; run publish again to retry them",
            ],
            Self::Config(_) => vec!["Run `draft-publisher check` to validate the configuration"],
            Self::TokenMissing { .. } => vec!["Set the GITHUB_TOKEN environment variable"],
            Self::DraftStore(_) => vec!["Check the drafts file path and permissions"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::NothingToPublish => "NOTHING_TO_PUBLISH",
            Self::InvalidDraft { .. } => "INVALID_DRAFT",
            Self::Remote(RemoteError::VersionConflict { .. }) => "VERSION_CONFLICT",
            Self::Remote(RemoteError::Network(_)) => "NETWORK_ERROR",
            Self::Remote(_) => "REMOTE_ERROR",
            Self::AggregateBatchFailure { .. } => "AGGREGATE_BATCH_FAILURE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::TokenMissing { .. } => "TOKEN_MISSING",
            Self::DraftStore(_) => "DRAFT_STORE_ERROR",
        }
    }
}
