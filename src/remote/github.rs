//! remote::github
//!
//! `RemoteFileStore` over the GitHub repository contents API.
//!
//! Files live under `{content_dir}/{path}` on one branch. The blob `sha`
//! returned by GitHub is the version token: a write that carries a stale
//! `sha` is rejected with 409, and a create over an existing file is rejected
//! with 422 ("sha wasn't supplied"). Both surface as
//! [`RemoteError::VersionConflict`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::core::config::{DEFAULT_API_BASE, DEFAULT_BRANCH, DEFAULT_CONTENT_DIR, RemoteConfig};
use crate::core::error::{PublishError, RemoteError};
use crate::core::traits::{FileVersion, PutRequest, RemoteFile, RemoteFileStore};

/// User-Agent header value for API requests
const USER_AGENT_VALUE: &str = "draft-publisher";

/// GitHub contents API store
pub struct GitHubFileStore {
    client: Client,
    token: SecretString,
    owner: String,
    repo: String,
    branch: String,
    content_dir: String,
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubFileStore")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("content_dir", &self.content_dir)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

impl GitHubFileStore {
    /// Store for `owner/repo` with default branch, content directory and API base
    pub fn new(token: SecretString, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token,
            owner: owner.into(),
            repo: repo.into(),
            branch: DEFAULT_BRANCH.to_string(),
            content_dir: DEFAULT_CONTENT_DIR.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Build a store from configuration
    pub fn from_config(config: &RemoteConfig, token: SecretString) -> Result<Self, PublishError> {
        let (owner, repo) = config.repository().ok_or_else(|| {
            PublishError::Config("remote.owner and remote.repo are required".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .map_err(|e| PublishError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: config.branch().to_string(),
            content_dir: config.content_dir().to_string(),
            api_base: config.api_base().to_string(),
        })
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_content_dir(mut self, content_dir: impl Into<String>) -> Self {
        self.content_dir = content_dir.into();
        self
    }

    /// Use a different API base (GitHub Enterprise or a test server)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn headers(&self) -> Result<HeaderMap, RemoteError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token.expose_secret()))
            .map_err(|_| RemoteError::Api {
                status: 401,
                message: "token contains invalid header characters".to_string(),
            })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Repository path of `path`, below the content directory
    fn repo_path(&self, path: &str) -> String {
        let dir = self.content_dir.trim_matches('/');
        let path = path.trim_start_matches('/');
        if dir.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", dir, path)
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.repo_path(path)
        )
    }

    async fn error_message(response: Response) -> String {
        match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        }
    }

    /// Map a non-success write response
    async fn put_error(&self, path: &str, response: Response) -> RemoteError {
        let status = response.status();
        let message = Self::error_message(response).await;

        match status {
            StatusCode::CONFLICT => RemoteError::VersionConflict {
                path: path.to_string(),
            },
            StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => {
                RemoteError::VersionConflict {
                    path: path.to_string(),
                }
            }
            _ => RemoteError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Decode a contents API payload (base64 with embedded line breaks)
fn decode_content(encoded: &str) -> Result<String, RemoteError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| RemoteError::Decode(format!("invalid base64 content: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| RemoteError::Decode(format!("content is not UTF-8: {}", e)))
}

#[async_trait]
impl RemoteFileStore for GitHubFileStore {
    fn describe(&self) -> String {
        format!("{}/{}@{}", self.owner, self.repo, self.branch)
    }

    async fn get(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError> {
        let url = self.contents_url(path);
        tracing::debug!(%url, "GET contents");

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: Self::error_message(response).await,
            });
        }

        let body: ContentResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("unexpected contents response: {}", e)))?;
        let content = match body.content {
            Some(encoded) => decode_content(&encoded)?,
            None => String::new(),
        };

        Ok(Some(RemoteFile {
            path: path.to_string(),
            content,
            version: FileVersion::new(body.sha),
        }))
    }

    async fn put(&self, request: PutRequest) -> Result<FileVersion, RemoteError> {
        let url = self.contents_url(&request.path);
        tracing::debug!(
            %url,
            update = request.expected_version.is_some(),
            "PUT contents"
        );

        let body = PutBody {
            message: &request.message,
            content: STANDARD.encode(request.content.as_bytes()),
            branch: &self.branch,
            sha: request.expected_version.as_ref().map(|v| v.as_str()),
        };

        let response = self
            .client
            .put(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.put_error(&request.path, response).await);
        }

        let created: PutResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(format!("unexpected write response: {}", e)))?;

        Ok(FileVersion::new(created.content.sha))
    }
}
