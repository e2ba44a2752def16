//! remote::memory
//!
//! In-memory `RemoteFileStore` with the same version semantics as the GitHub
//! store. Records every call and can be told to fail, which makes it the
//! test double for the publish coordinator. The CLI also uses it to simulate
//! publishing when no repository is configured.
//!
//! # Example
//!
//! ```
//! use draft_publisher::remote::{FailOn, MemoryFileStore};
//! use draft_publisher::core::RemoteError;
//!
//! let store = MemoryFileStore::new()
//!     .with_file("hello.md", "# Hello")
//!     .fail_on(FailOn::put("broken.md", RemoteError::Network("reset".into())));
//! assert_eq!(store.file_count(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::error::RemoteError;
use crate::core::traits::{FileVersion, PutRequest, RemoteFile, RemoteFileStore};

/// In-memory store, shared across clones
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    files: BTreeMap<String, StoredFile>,
    /// Last issued version number
    revision: u64,
    failures: Vec<FailOn>,
    /// Third-party writes applied right before the next put on a path
    interference: Vec<(String, String)>,
    operations: Vec<StoreOperation>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    version: FileVersion,
}

/// Operation kind a failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMethod {
    Get,
    Put,
}

/// Injected failure for one path
#[derive(Debug, Clone)]
pub struct FailOn {
    method: StoreMethod,
    path: String,
    error: RemoteError,
    /// Matching calls to let through before failing
    skip: usize,
    /// Remaining failures; `None` fails forever
    remaining: Option<usize>,
}

impl FailOn {
    /// Fail every `get` of `path`
    pub fn get(path: impl Into<String>, error: RemoteError) -> Self {
        Self {
            method: StoreMethod::Get,
            path: path.into(),
            error,
            skip: 0,
            remaining: None,
        }
    }

    /// Fail every `put` to `path`
    pub fn put(path: impl Into<String>, error: RemoteError) -> Self {
        Self {
            method: StoreMethod::Put,
            path: path.into(),
            error,
            skip: 0,
            remaining: None,
        }
    }

    /// Limit the failure to `count` matching calls; `times(0)` never fails
    pub fn times(mut self, count: usize) -> Self {
        self.remaining = Some(count);
        self
    }

    /// Let the first `calls` matching calls succeed
    pub fn after(mut self, calls: usize) -> Self {
        self.skip = calls;
        self
    }
}

/// Recorded operation for test verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Get {
        path: String,
    },
    Put {
        path: String,
        message: String,
        expected_version: Option<FileVersion>,
    },
}

impl StoreOperation {
    pub fn path(&self) -> &str {
        match self {
            Self::Get { path } | Self::Put { path, .. } => path,
        }
    }
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let version = inner.next_version();
            inner.files.insert(
                path.into(),
                StoredFile {
                    content: content.into(),
                    version,
                },
            );
        }
        self
    }

    /// Configure a failure
    pub fn fail_on(self, failure: FailOn) -> Self {
        self.inner.lock().unwrap().failures.push(failure);
        self
    }

    /// Simulate another writer updating `path` between our read and our write
    pub fn interfere_before_next_put(&self, path: impl Into<String>, content: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.interference.push((path.into(), content.into()));
    }

    /// Get all recorded operations
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Recorded operations touching `path`
    pub fn operations_for(&self, path: &str) -> Vec<StoreOperation> {
        self.operations()
            .into_iter()
            .filter(|op| op.path() == path)
            .collect()
    }

    pub fn clear_operations(&self) {
        self.inner.lock().unwrap().operations.clear();
    }

    /// Current content and version of `path` (for test verification)
    pub fn file(&self, path: &str) -> Option<(String, FileVersion)> {
        let inner = self.inner.lock().unwrap();
        inner
            .files
            .get(path)
            .map(|f| (f.content.clone(), f.version.clone()))
    }

    pub fn file_count(&self) -> usize {
        self.inner.lock().unwrap().files.len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.inner.lock().unwrap().files.keys().cloned().collect()
    }
}

impl MemoryStoreInner {
    fn next_version(&mut self) -> FileVersion {
        self.revision += 1;
        FileVersion::new(format!("mem-{}", self.revision))
    }

    /// Consume a matching injected failure, if any
    fn take_failure(&mut self, method: StoreMethod, path: &str) -> Option<RemoteError> {
        let index = self.failures.iter().position(|f| {
            f.method == method && f.path == path && f.remaining != Some(0)
        })?;

        let failure = &mut self.failures[index];
        if failure.skip > 0 {
            failure.skip -= 1;
            return None;
        }

        let error = failure.error.clone();
        if let Some(remaining) = failure.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.failures.remove(index);
            }
        }
        Some(error)
    }

    fn apply_interference(&mut self, path: &str) {
        if let Some(index) = self.interference.iter().position(|(p, _)| p == path) {
            let (_, content) = self.interference.remove(index);
            let version = self.next_version();
            self.files
                .insert(path.to_string(), StoredFile { content, version });
        }
    }
}

#[async_trait]
impl RemoteFileStore for MemoryFileStore {
    fn describe(&self) -> String {
        "in-memory store".to_string()
    }

    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::Get {
            path: path.to_string(),
        });

        if let Some(error) = inner.take_failure(StoreMethod::Get, path) {
            return Err(error);
        }

        Ok(inner.files.get(path).map(|f| RemoteFile {
            path: path.to_string(),
            content: f.content.clone(),
            version: f.version.clone(),
        }))
    }

    async fn put(&self, request: PutRequest) -> Result<FileVersion, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(StoreOperation::Put {
            path: request.path.clone(),
            message: request.message.clone(),
            expected_version: request.expected_version.clone(),
        });

        if let Some(error) = inner.take_failure(StoreMethod::Put, &request.path) {
            return Err(error);
        }

        inner.apply_interference(&request.path);

        let current = inner.files.get(&request.path).map(|f| &f.version);
        if current != request.expected_version.as_ref() {
            return Err(RemoteError::VersionConflict { path: request.path });
        }

        let version = inner.next_version();
        inner.files.insert(
            request.path,
            StoredFile {
                content: request.content,
                version: version.clone(),
            },
        );

        Ok(version)
    }
}
