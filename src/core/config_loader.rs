//! Configuration file loader for draft-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".draft-publisher.yaml";

lazy_static! {
    /// Environment variable reference (${VAR_NAME})
    static ref ENV_VAR_REGEX: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Home directory holding the global config (skipped when `None`)
    pub home_dir: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublisherConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options for `project_path` using the process environment
    pub fn from_process_env(project_path: impl Into<PathBuf>) -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let home_dir = env.get("HOME").map(PathBuf::from);

        Self {
            project_path: project_path.into(),
            home_dir,
            cli_args: None,
            env,
        }
    }
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field path (e.g., "remote.branch")
    pub field: String,
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.draft-publisher.yaml)
    /// 4. Global config (~/.draft-publisher.yaml)
    /// 5. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, PublishError> {
        let mut configs: Vec<PublisherConfig> = Vec::new();

        configs.push(PublisherConfig::default());

        if let Some(home_dir) = &options.home_dir
            && let Some(global_config) = Self::load_config_file(&home_dir.join(CONFIG_FILENAME)).await?
        {
            configs.push(global_config);
        }

        if let Some(project_config) = Self::load_project_config(&options.project_path).await? {
            configs.push(project_config);
        }

        if let Some(env_config) = Self::load_env_config(&options.env) {
            configs.push(env_config);
        }

        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged_config = Self::merge_configs(configs);

        let config = Self::expand_env_vars(merged_config, &options.env);
        tracing::debug!(?config, "configuration loaded");

        Ok(config)
    }

    async fn load_project_config(
        project_path: &Path,
    ) -> Result<Option<PublisherConfig>, PublishError> {
        Self::load_config_file(&project_path.join(CONFIG_FILENAME)).await
    }

    /// Load configuration from YAML file
    fn load_config_file(
        file_path: &Path,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<Option<PublisherConfig>, PublishError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            if !file_path.exists() {
                return Ok(None);
            }

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                PublishError::Config(format!(
                    "failed to read {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            let config: PublisherConfig = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::Config(format!(
                    "failed to parse {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            if let Some(extends_path) = &config.extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| PublishError::Config("invalid config file path".to_string()))?
                    .join(extends_path);

                if let Some(base_config) = Self::load_config_file(&base_path).await? {
                    return Ok(Some(Self::merge_configs(vec![base_config, config])));
                }
                tracing::warn!(path = %base_path.display(), "extended config file not found");
            }

            Ok(Some(config))
        })
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<PublisherConfig> {
        let mut remote = RemoteConfig::default();
        let mut has_changes = false;

        let mut take = |key: &str, slot: &mut Option<String>| {
            if let Some(value) = env.get(key).filter(|v| !v.is_empty()) {
                *slot = Some(value.clone());
                has_changes = true;
            }
        };

        take("GITHUB_OWNER", &mut remote.owner);
        take("GITHUB_REPO", &mut remote.repo);
        take("GITHUB_BRANCH", &mut remote.branch);
        take("GITHUB_API_BASE", &mut remote.api_base);
        take("DRAFT_PUBLISHER_CONTENT_DIR", &mut remote.content_dir);

        if !has_changes {
            return None;
        }

        Some(PublisherConfig {
            remote,
            ..Self::empty()
        })
    }

    /// A layer that overrides nothing
    fn empty() -> PublisherConfig {
        PublisherConfig {
            version: String::new(),
            ..Default::default()
        }
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<PublisherConfig>) -> PublisherConfig {
        let mut result = PublisherConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut PublisherConfig, source: PublisherConfig) {
        if !source.version.is_empty() {
            target.version = source.version;
        }

        if source.extends.is_some() {
            target.extends = source.extends;
        }

        let remote = source.remote;
        let overrides = [
            (&mut target.remote.api_base, remote.api_base),
            (&mut target.remote.owner, remote.owner),
            (&mut target.remote.repo, remote.repo),
            (&mut target.remote.branch, remote.branch),
            (&mut target.remote.content_dir, remote.content_dir),
        ];
        for (slot, value) in overrides {
            if value.is_some() {
                *slot = value;
            }
        }
        if remote.timeout_secs.is_some() {
            target.remote.timeout_secs = remote.timeout_secs;
        }

        if source.drafts.path.is_some() {
            target.drafts.path = source.drafts.path;
        }

        if source.publish.confirm.is_some() {
            target.publish.confirm = source.publish.confirm;
        }
    }

    /// Expand `${VAR}` references in string settings
    fn expand_env_vars(mut config: PublisherConfig, env: &HashMap<String, String>) -> PublisherConfig {
        let remote = &mut config.remote;
        for slot in [
            &mut remote.api_base,
            &mut remote.owner,
            &mut remote.repo,
            &mut remote.branch,
            &mut remote.content_dir,
        ] {
            if let Some(value) = slot.as_mut() {
                *value = Self::expand_string(value, env);
            }
        }

        config
    }

    /// Expand environment variables in a single string
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let mut result = input.to_string();
        for cap in ENV_VAR_REGEX.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                tracing::warn!(variable = var_name, "environment variable not found");
            }
        }

        result
    }

    /// Validate configuration
    pub fn validate(config: &PublisherConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.version.is_empty() {
            errors.push(ConfigValidationError {
                field: "version".to_string(),
                message: "Version is required".to_string(),
            });
        } else if config.version != "1.0" {
            warnings.push(ConfigValidationWarning {
                field: "version".to_string(),
                message: format!("Unknown version: {}", config.version),
                suggestion: Some("Currently supported version is \"1.0\" only".to_string()),
            });
        }

        Self::validate_remote(&config.remote, &mut errors, &mut warnings);

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn validate_remote(
        remote: &RemoteConfig,
        errors: &mut Vec<ConfigValidationError>,
        warnings: &mut Vec<ConfigValidationWarning>,
    ) {
        if remote.branch().trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "remote.branch".to_string(),
                message: "branch must not be empty".to_string(),
            });
        }

        if remote.timeout_secs() == 0 {
            errors.push(ConfigValidationError {
                field: "remote.timeoutSecs".to_string(),
                message: "timeout must be at least 1 second".to_string(),
            });
        }

        if !remote.api_base().starts_with("http://") && !remote.api_base().starts_with("https://") {
            errors.push(ConfigValidationError {
                field: "remote.apiBase".to_string(),
                message: format!("not an http(s) URL: {}", remote.api_base()),
            });
        }

        match (remote.owner.is_some(), remote.repo.is_some()) {
            (true, false) => errors.push(ConfigValidationError {
                field: "remote.repo".to_string(),
                message: "repo is required when owner is set".to_string(),
            }),
            (false, true) => errors.push(ConfigValidationError {
                field: "remote.owner".to_string(),
                message: "owner is required when repo is set".to_string(),
            }),
            (false, false) => warnings.push(ConfigValidationWarning {
                field: "remote".to_string(),
                message: "No remote repository configured".to_string(),
                suggestion: Some(
                    "Set remote.owner and remote.repo, or GITHUB_OWNER and GITHUB_REPO".to_string(),
                ),
            }),
            (true, true) => {}
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}
