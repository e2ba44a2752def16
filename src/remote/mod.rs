//! Remote content stores
//!
//! Implementations of [`RemoteFileStore`](crate::core::RemoteFileStore):
//! the GitHub repository contents API and an in-memory store used by tests
//! and by the CLI when no repository is configured.

pub mod github;
pub mod memory;

pub use github::GitHubFileStore;
pub use memory::{FailOn, MemoryFileStore, StoreOperation};
