//! Core traits and types for draft publishing
//!
//! This module defines the remote file store and draft store abstractions
//! and the values that flow between them and the publish coordinator.

use crate::core::error::{DraftStoreError, RemoteError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Remote files
// ============================================================================

/// Opaque revision token issued by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileVersion(String);

impl FileVersion {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileVersion {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for FileVersion {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// A file as currently stored remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub version: FileVersion,
}

/// A single-file write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    pub path: String,
    pub content: String,
    /// Commit message
    pub message: String,
    /// Revision being replaced; `None` means create
    pub expected_version: Option<FileVersion>,
}

/// Path-addressed, versioned content storage
///
/// Implementations must treat "not found" as a value, not an error, and must
/// report a stale `expected_version` (or a create over an existing path) as
/// [`RemoteError::VersionConflict`].
#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    /// Short human-readable name of the target (e.g. `owner/repo@main`)
    fn describe(&self) -> String;

    /// Read the current content and version of `path`
    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError>;

    /// Write one file, returning the new version token
    async fn put(&self, request: PutRequest) -> Result<FileVersion, RemoteError>;
}

// ============================================================================
// Drafts
// ============================================================================

/// A locally authored, not yet published document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new draft
#[derive(Debug, Clone, Default)]
pub struct NewDraft {
    pub title: String,
    pub body: String,
}

/// Partial update of a draft
#[derive(Debug, Clone, Default)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl DraftPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

/// Persistent, ordered collection of drafts
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// All drafts in insertion order
    async fn list(&self) -> Result<Vec<Draft>, DraftStoreError>;

    async fn insert(&self, draft: NewDraft) -> Result<Draft, DraftStoreError>;

    async fn update(&self, id: &str, patch: DraftPatch) -> Result<Draft, DraftStoreError>;

    async fn remove(&self, id: &str) -> Result<(), DraftStoreError>;
}

// ============================================================================
// Batch results
// ============================================================================

/// Outcome of publishing one draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DraftOutcome {
    Succeeded {
        draft_id: String,
        title: String,
        path: String,
        version: FileVersion,
    },
    Failed {
        draft_id: String,
        title: String,
        path: String,
        reason: String,
    },
}

impl DraftOutcome {
    pub fn draft_id(&self) -> &str {
        match self {
            Self::Succeeded { draft_id, .. } | Self::Failed { draft_id, .. } => draft_id,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Succeeded { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// A draft that could not be published, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftFailure {
    pub draft_id: String,
    pub title: String,
    pub reason: String,
}

/// Per-draft outcomes of one publish invocation, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchPublishResult {
    pub outcomes: Vec<DraftOutcome>,
    pub all_succeeded: bool,
    pub succeeded_count: usize,
    pub failed_count: usize,
}

impl BatchPublishResult {
    pub fn from_outcomes(outcomes: Vec<DraftOutcome>) -> Self {
        let succeeded_count = outcomes.iter().filter(|o| o.is_success()).count();
        let failed_count = outcomes.len() - succeeded_count;

        Self {
            all_succeeded: failed_count == 0,
            succeeded_count,
            failed_count,
            outcomes,
        }
    }

    /// Drafts that were written, as `(draft_id, path, version)`
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &str, &FileVersion)> {
        self.outcomes.iter().filter_map(|o| match o {
            DraftOutcome::Succeeded {
                draft_id,
                path,
                version,
                ..
            } => Some((draft_id.as_str(), path.as_str(), version)),
            DraftOutcome::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> Vec<DraftFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                DraftOutcome::Failed {
                    draft_id,
                    title,
                    reason,
                    ..
                } => Some(DraftFailure {
                    draft_id: draft_id.clone(),
                    title: title.clone(),
                    reason: reason.clone(),
                }),
                DraftOutcome::Succeeded { .. } => None,
            })
            .collect()
    }

    /// Human-readable summary for the caller
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Published {} of {} draft(s)",
            self.succeeded_count,
            self.outcomes.len()
        )];

        for outcome in &self.outcomes {
            match outcome {
                DraftOutcome::Succeeded { path, version, .. } => {
                    lines.push(format!("  ✅ {} ({})", path, version));
                }
                DraftOutcome::Failed { title, reason, .. } => {
                    lines.push(format!("  ❌ {}: {}", title, reason));
                }
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn succeeded(id: &str, path: &str) -> DraftOutcome {
        DraftOutcome::Succeeded {
            draft_id: id.to_string(),
            title: id.to_string(),
            path: path.to_string(),
            version: FileVersion::new(format!("sha-{}", id)),
        }
    }

    fn failed(id: &str) -> DraftOutcome {
        DraftOutcome::Failed {
            draft_id: id.to_string(),
            title: format!("Title {}", id),
            path: format!("title-{}.md", id),
            reason: "network error: reset".to_string(),
        }
    }

    #[test]
    fn test_batch_result_counts() {
        let result =
            BatchPublishResult::from_outcomes(vec![succeeded("1", "a.md"), failed("2"), succeeded("3", "c.md")]);

        assert!(!result.all_succeeded);
        assert_eq!(result.succeeded_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.failures().len(), 1);
        assert_eq!(result.failures()[0].title, "Title 2");

        let written: Vec<_> = result.succeeded().map(|(id, _, _)| id).collect();
        assert_eq!(written, vec!["1", "3"]);
    }

    #[test]
    fn test_batch_result_all_succeeded() {
        let result = BatchPublishResult::from_outcomes(vec![succeeded("1", "a.md")]);

        assert!(result.all_succeeded);
        assert!(result.failures().is_empty());
        assert!(result.summary().contains("Published 1 of 1"));
    }

    #[test]
    fn test_summary_lists_failures_with_reason() {
        let result = BatchPublishResult::from_outcomes(vec![failed("7")]);
        let summary = result.summary();

        assert!(summary.contains("Published 0 of 1"));
        assert!(summary.contains("Title 7: network error: reset"));
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let now = Utc::now();
        let draft = Draft {
            id: "abc".to_string(),
            title: "Hello".to_string(),
            body: "World".to_string(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&draft).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));

        let back: Draft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn test_outcome_serialization_tag() {
        let json = serde_json::to_string(&succeeded("1", "a.md")).unwrap();
        assert!(json.contains("\"status\":\"succeeded\""));
        assert!(json.contains("\"version\":\"sha-1\""));
    }

    #[test]
    fn test_draft_patch_is_empty() {
        assert!(DraftPatch::default().is_empty());
        assert!(
            !DraftPatch {
                title: Some("x".into()),
                body: None
            }
            .is_empty()
        );
    }
}
