//! JsonDraftStore - Persist drafts in a JSON file
//!
//! Features:
//! - Insertion-ordered draft list
//! - UUID identifiers and creation/update timestamps
//! - Atomic writes (temp file, then rename)
//! - A missing file reads as an empty list

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::core::error::DraftStoreError;
use crate::core::traits::{Draft, DraftPatch, DraftStore, NewDraft};

const FILE_FORMAT_VERSION: &str = "1.0";

/// On-disk layout of the draft file
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftsFile {
    version: String,
    drafts: Vec<Draft>,
    last_updated: String,
}

/// File-backed draft store
#[derive(Debug)]
pub struct JsonDraftStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonDraftStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<Draft>, DraftStoreError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let parsed: DraftsFile = serde_json::from_str(&data)?;
        Ok(parsed.drafts)
    }

    async fn write_all(&self, drafts: Vec<Draft>) -> Result<(), DraftStoreError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).await?;
        }

        let data = DraftsFile {
            version: FILE_FORMAT_VERSION.to_string(),
            drafts,
            last_updated: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&data)?;

        // Atomic write: write to temp file, then rename
        let temp_file = self.path.with_extension("json.tmp");
        fs::write(&temp_file, json).await?;
        fs::rename(&temp_file, &self.path).await?;

        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), DraftStoreError> {
    if value.trim().is_empty() {
        return Err(DraftStoreError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[async_trait]
impl DraftStore for JsonDraftStore {
    async fn list(&self) -> Result<Vec<Draft>, DraftStoreError> {
        self.read_all().await
    }

    async fn insert(&self, draft: NewDraft) -> Result<Draft, DraftStoreError> {
        require_text("title", &draft.title)?;
        require_text("body", &draft.body)?;

        let _guard = self.write_lock.lock().await;
        let mut drafts = self.read_all().await?;

        let now = Utc::now();
        let created = Draft {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            body: draft.body,
            created_at: now,
            updated_at: now,
        };
        drafts.push(created.clone());
        self.write_all(drafts).await?;

        tracing::debug!(id = %created.id, "draft created");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: DraftPatch) -> Result<Draft, DraftStoreError> {
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        if let Some(body) = &patch.body {
            require_text("body", body)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut drafts = self.read_all().await?;

        let draft = drafts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DraftStoreError::NotFound(id.to_string()))?;

        if let Some(title) = patch.title {
            draft.title = title;
        }
        if let Some(body) = patch.body {
            draft.body = body;
        }
        draft.updated_at = Utc::now();
        let updated = draft.clone();

        self.write_all(drafts).await?;
        Ok(updated)
    }

    async fn remove(&self, id: &str) -> Result<(), DraftStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut drafts = self.read_all().await?;

        let before = drafts.len();
        drafts.retain(|d| d.id != id);
        if drafts.len() == before {
            return Err(DraftStoreError::NotFound(id.to_string()));
        }

        self.write_all(drafts).await?;
        tracing::debug!(%id, "draft removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_draft(title: &str, body: &str) -> NewDraft {
        NewDraft {
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    fn store_in(dir: &TempDir) -> JsonDraftStore {
        JsonDraftStore::new(dir.path().join("nested/drafts.json"))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_preserves_order_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let first = store.insert(new_draft("First", "one")).await.unwrap();
        let second = store.insert(new_draft("Second", "two")).await.unwrap();
        assert_ne!(first.id, second.id);

        let reopened = store_in(&dir);
        let titles: Vec<_> = reopened
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert!(!dir.path().join("nested/drafts.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_insert_rejects_blank_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.insert(new_draft("  ", "body")).await.unwrap_err();
        assert!(matches!(err, DraftStoreError::Invalid(_)));
        let err = store.insert(new_draft("Title", "\n")).await.unwrap_err();
        assert!(matches!(err, DraftStoreError::Invalid(_)));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_fields_and_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let draft = store.insert(new_draft("Title", "body")).await.unwrap();

        let updated = store
            .update(
                &draft.id,
                DraftPatch {
                    title: None,
                    body: Some("new body".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Title");
        assert_eq!(updated.body, "new body");
        assert_eq!(updated.created_at, draft.created_at);
        assert!(updated.updated_at >= draft.updated_at);
        assert_eq!(store.list().await.unwrap()[0].body, "new body");
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store
            .update("missing", DraftPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DraftStoreError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let keep = store.insert(new_draft("Keep", "a")).await.unwrap();
        let drop = store.insert(new_draft("Drop", "b")).await.unwrap();

        store.remove(&drop.id).await.unwrap();

        let remaining = store.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
        assert!(matches!(
            store.remove(&drop.id).await.unwrap_err(),
            DraftStoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_corrupted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drafts.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonDraftStore::new(&path).list().await.unwrap_err();
        assert!(matches!(err, DraftStoreError::Corrupted(_)));
    }
}
