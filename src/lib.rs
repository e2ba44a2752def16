pub mod core;
pub mod drafts;
pub mod orchestration;
pub mod remote;
pub mod security;

pub use crate::core::*;
pub use drafts::JsonDraftStore;
pub use orchestration::PublishCoordinator;
pub use remote::{GitHubFileStore, MemoryFileStore};
pub use security::SecureTokenManager;
