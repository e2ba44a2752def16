//! Local draft storage
//!
//! Drafts are authored and kept locally until they are published. The
//! [`DraftStore`](crate::core::DraftStore) trait is the seam; `JsonDraftStore`
//! is the file-backed implementation the CLI uses.

pub mod store;

pub use store::JsonDraftStore;
