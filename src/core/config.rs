//! Configuration structures and types for draft-publisher
//!
//! This module provides type-safe configuration management with serde support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default target branch
pub const DEFAULT_BRANCH: &str = "main";

/// Default directory inside the repository that receives posts
pub const DEFAULT_CONTENT_DIR: &str = "content";

/// Default location of the local draft list
pub const DEFAULT_DRAFTS_PATH: &str = ".draft-publisher/drafts.json";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublisherConfig {
    /// Schema version (required)
    pub version: String,

    /// Extend from base configuration file (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Remote repository settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local draft store settings
    #[serde(default)]
    pub drafts: DraftsConfig,

    /// Publish behaviour
    #[serde(default)]
    pub publish: PublishOptionsConfig,
}

/// Remote content repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// API base URL (GitHub Enterprise or a test server)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Repository owner (user or organization)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Repository name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Branch that receives commits (default: "main")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Directory inside the repository (default: "content")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl RemoteConfig {
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn content_dir(&self) -> &str {
        self.content_dir.as_deref().unwrap_or(DEFAULT_CONTENT_DIR)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// `(owner, repo)` when both are set and non-empty
    pub fn repository(&self) -> Option<(&str, &str)> {
        match (self.owner.as_deref(), self.repo.as_deref()) {
            (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
                Some((owner, repo))
            }
            _ => None,
        }
    }
}

/// Local draft store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DraftsConfig {
    /// Path of the JSON draft file, relative to the project directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl DraftsConfig {
    pub fn path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DRAFTS_PATH))
    }
}

/// Publish options configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PublishOptionsConfig {
    /// Ask before publishing (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<bool>,
}

impl PublishOptionsConfig {
    pub fn confirm(&self) -> bool {
        self.confirm.unwrap_or(true)
    }
}

/// Default configuration values
impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            extends: None,
            remote: RemoteConfig::default(),
            drafts: DraftsConfig::default(),
            publish: PublishOptionsConfig::default(),
        }
    }
}
