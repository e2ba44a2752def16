//! Publish Coordinator - Publishes a batch of drafts to a remote file store
//!
//! Features:
//! - Strictly sequential processing in input order
//! - Create-or-update per draft, decided by reading the remote path first
//! - One re-read-and-retry when a write hits a version conflict
//! - Per-draft failure isolation with an aggregate error at the end

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::error::{PublishError, RemoteError};
use crate::core::state_machine::{DraftAttempt, DraftPublishState};
use crate::core::traits::{
    BatchPublishResult, Draft, DraftOutcome, FileVersion, PutRequest, RemoteFile, RemoteFileStore,
};
use crate::orchestration::slug::{commit_message, draft_path, render_content};

/// PublishCoordinator - Writes drafts to a `RemoteFileStore`
#[derive(Clone)]
pub struct PublishCoordinator {
    store: Arc<dyn RemoteFileStore>,
}

impl std::fmt::Debug for PublishCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishCoordinator")
            .field("store", &self.store.describe())
            .finish()
    }
}

impl PublishCoordinator {
    /// Create a new PublishCoordinator
    ///
    /// # Arguments
    ///
    /// * `store` - Remote store that receives the drafts
    pub fn new(store: Arc<dyn RemoteFileStore>) -> Self {
        Self { store }
    }

    /// Human-readable name of the target store
    pub fn target(&self) -> String {
        self.store.describe()
    }

    /// Publish drafts one after another
    ///
    /// # Returns
    ///
    /// The per-draft outcomes when every draft was written. If any draft
    /// failed, `PublishError::AggregateBatchFailure` carries the failures and
    /// the full result, so the caller can still act on the drafts that
    /// succeeded.
    ///
    /// # Errors
    ///
    /// `NothingToPublish` for an empty batch and `InvalidDraft` for a draft
    /// without a title; neither makes a remote call.
    pub async fn publish_batch(&self, drafts: &[Draft]) -> Result<BatchPublishResult, PublishError> {
        if drafts.is_empty() {
            return Err(PublishError::NothingToPublish);
        }

        if let Some(draft) = drafts.iter().find(|d| d.title.trim().is_empty()) {
            return Err(PublishError::InvalidDraft {
                draft_id: draft.id.clone(),
                reason: "title is empty".to_string(),
            });
        }

        info!(
            count = drafts.len(),
            target = %self.store.describe(),
            "publishing drafts"
        );

        let mut outcomes = Vec::with_capacity(drafts.len());
        let mut seen_paths: HashMap<String, &str> = HashMap::new();

        for draft in drafts {
            let path = draft_path(&draft.title);
            if let Some(previous) = seen_paths.insert(path.clone(), &draft.id) {
                warn!(
                    %path,
                    draft_id = %draft.id,
                    previous_draft_id = %previous,
                    "two drafts map to the same path; the later one overwrites the earlier"
                );
            }

            outcomes.push(self.publish_draft(draft, path).await);
        }

        let result = BatchPublishResult::from_outcomes(outcomes);
        info!(
            succeeded = result.succeeded_count,
            failed = result.failed_count,
            "batch finished"
        );

        if result.all_succeeded {
            Ok(result)
        } else {
            Err(PublishError::AggregateBatchFailure {
                failures: result.failures(),
                result,
            })
        }
    }

    /// Fetch the current remote content of `path`
    pub async fn fetch(&self, path: &str) -> Result<Option<RemoteFile>, PublishError> {
        Ok(self.store.get(path).await?)
    }

    /// Publish a single draft; errors never escape, they become outcomes
    async fn publish_draft(&self, draft: &Draft, path: String) -> DraftOutcome {
        let mut attempt = DraftAttempt::new(path);
        let result = self.write_draft(draft, &mut attempt).await;

        let outcome = match result {
            Ok(version) => {
                if let Err(e) = attempt.transition(DraftPublishState::Succeeded) {
                    warn!(error = %e, "unexpected draft state");
                }
                info!(path = attempt.path(), %version, retried = attempt.retried(), "draft published");
                DraftOutcome::Succeeded {
                    draft_id: draft.id.clone(),
                    title: draft.title.clone(),
                    path: attempt.path().to_string(),
                    version,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                if let Err(e) = attempt.fail(reason.clone()) {
                    warn!(error = %e, "unexpected draft state");
                }
                warn!(path = attempt.path(), %reason, "draft failed");
                DraftOutcome::Failed {
                    draft_id: draft.id.clone(),
                    title: draft.title.clone(),
                    path: attempt.path().to_string(),
                    reason,
                }
            }
        };

        debug!(
            history = %attempt.get_history(),
            last_error = attempt.get_last_error(),
            "draft attempt finished"
        );
        outcome
    }

    /// Read, write, and on a version conflict re-read and write once more
    async fn write_draft(
        &self,
        draft: &Draft,
        attempt: &mut DraftAttempt,
    ) -> Result<FileVersion, RemoteError> {
        let path = attempt.path().to_string();
        let content = render_content(&draft.title, &draft.body);

        let existing = self.store.get(&path).await?;
        debug!(%path, exists = existing.is_some(), "read remote path");

        let first = self
            .store
            .put(self.put_request(draft, &path, &content, existing))
            .await;

        match first {
            Err(e) if e.is_version_conflict() => {
                // ConflictRetrying is only reachable once per attempt
                if attempt.transition(DraftPublishState::ConflictRetrying).is_err() {
                    return Err(e);
                }
                warn!(%path, "version conflict, retrying with latest version");

                let latest = self.store.get(&path).await?;
                self.store
                    .put(self.put_request(draft, &path, &content, latest))
                    .await
            }
            other => other,
        }
    }

    fn put_request(
        &self,
        draft: &Draft,
        path: &str,
        content: &str,
        existing: Option<RemoteFile>,
    ) -> PutRequest {
        PutRequest {
            path: path.to_string(),
            content: content.to_string(),
            message: commit_message(&draft.title, existing.is_some()),
            expected_version: existing.map(|f| f.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{FailOn, MemoryFileStore, StoreOperation};
    use chrono::Utc;

    fn draft(id: &str, title: &str) -> Draft {
        let now = Utc::now();
        Draft {
            id: id.to_string(),
            title: title.to_string(),
            body: format!("Body of {}", title),
            created_at: now,
            updated_at: now,
        }
    }

    fn coordinator(store: &MemoryFileStore) -> PublishCoordinator {
        PublishCoordinator::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_publish_single_new_draft() {
        let store = MemoryFileStore::new();
        let result = coordinator(&store)
            .publish_batch(&[draft("1", "First Post")])
            .await
            .unwrap();

        assert!(result.all_succeeded);
        let (content, _) = store.file("first-post.md").unwrap();
        assert_eq!(content, "# First Post\n\nBody of First Post");
    }

    #[tokio::test]
    async fn test_empty_title_fails_before_remote_calls() {
        let store = MemoryFileStore::new();
        let err = coordinator(&store)
            .publish_batch(&[draft("1", "Fine"), draft("2", "   ")])
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::InvalidDraft { ref draft_id, .. } if draft_id == "2"));
        assert!(store.operations().is_empty());
    }

    #[tokio::test]
    async fn test_retry_recomputes_commit_message() {
        let store = MemoryFileStore::new();
        store.interfere_before_next_put("race.md", "someone else");

        coordinator(&store)
            .publish_batch(&[draft("1", "Race")])
            .await
            .unwrap();

        let puts: Vec<_> = store
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                StoreOperation::Put { message, .. } => Some(message),
                StoreOperation::Get { .. } => None,
            })
            .collect();
        assert_eq!(puts, vec!["Add post: Race", "Update post: Race"]);
    }

    #[tokio::test]
    async fn test_get_failure_fails_only_that_draft() {
        let store = MemoryFileStore::new().fail_on(FailOn::get(
            "b.md",
            RemoteError::Network("timed out".to_string()),
        ));

        let err = coordinator(&store)
            .publish_batch(&[draft("1", "A"), draft("2", "B")])
            .await
            .unwrap_err();

        match err {
            PublishError::AggregateBatchFailure { failures, result } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].draft_id, "2");
                assert!(failures[0].reason.contains("timed out"));
                assert_eq!(result.succeeded_count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.file("a.md").is_some());
    }

    #[tokio::test]
    async fn test_fetch() {
        let store = MemoryFileStore::new().with_file("hello.md", "# Hello");
        let coordinator = coordinator(&store);

        let file = coordinator.fetch("hello.md").await.unwrap().unwrap();
        assert_eq!(file.content, "# Hello");
        assert!(coordinator.fetch("missing.md").await.unwrap().is_none());
    }
}
