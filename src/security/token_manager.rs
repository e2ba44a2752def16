//! Secure token manager with memory-safe handling and masking capabilities
//!
//! The GitHub access token is read from the environment into a
//! `secrecy::SecretString`, so it never shows up in `Debug` output, and can be
//! masked out of any text before it is printed or logged.

use secrecy::{ExposeSecret, SecretString};
use std::env;

use crate::core::error::PublishError;

/// Environment variable holding the GitHub access token
pub const DEFAULT_TOKEN_VARIABLE: &str = "GITHUB_TOKEN";

/// Secure token manager for the remote repository token
///
/// # Examples
///
/// ```
/// use draft_publisher::security::SecureTokenManager;
/// use secrecy::ExposeSecret;
///
/// let manager = SecureTokenManager::new();
/// if let Some(token) = manager.get_token() {
///     println!("GitHub token found: {}", manager.mask_token(token.expose_secret()));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    variable: String,
}

impl Default for SecureTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureTokenManager {
    /// Creates a manager reading `GITHUB_TOKEN`
    pub fn new() -> Self {
        Self::with_variable(DEFAULT_TOKEN_VARIABLE)
    }

    /// Creates a manager reading a different environment variable
    pub fn with_variable(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    /// Name of the environment variable the token is read from
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Retrieves the token from the environment
    ///
    /// Returns `None` if the variable is unset or blank.
    pub fn get_token(&self) -> Option<SecretString> {
        let value = env::var(&self.variable).ok()?;
        if value.trim().is_empty() {
            return None;
        }
        Some(SecretString::new(value.trim().into()))
    }

    /// Like [`get_token`](Self::get_token), but a missing token is an error
    pub fn require_token(&self) -> Result<SecretString, PublishError> {
        self.get_token().ok_or_else(|| PublishError::TokenMissing {
            variable: self.variable.clone(),
        })
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    ///
    /// # Examples
    ///
    /// ```
    /// use draft_publisher::security::SecureTokenManager;
    ///
    /// let manager = SecureTokenManager::new();
    /// assert_eq!(manager.mask_token("ghp_abcdef123456"), "ghp...456");
    /// assert_eq!(manager.mask_token("short"), "****");
    /// ```
    pub fn mask_token(&self, token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 10 {
            return "****".to_string();
        }

        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Replaces every occurrence of the configured token in `text` with its
    /// masked form
    pub fn mask_tokens_in_string(&self, text: &str) -> String {
        match self.get_token() {
            Some(token) => {
                let token_str = token.expose_secret();
                text.replace(token_str, &self.mask_token(token_str))
            }
            None => text.to_string(),
        }
    }
}
