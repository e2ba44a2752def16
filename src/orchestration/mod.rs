//! Orchestration layer for draft publishing
//!
//! This module provides the publish coordinator and the rules that turn a
//! draft into a remote file (path, content, commit message).

pub mod batch_publisher;
pub mod slug;

// Re-export main types for convenience
pub use batch_publisher::PublishCoordinator;
pub use slug::{commit_message, draft_path, render_content, slugify};
