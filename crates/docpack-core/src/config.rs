//! Publish-target credential resolution.
//!
//! Resolution is a pure function over explicit request values and a snapshot
//! of the environment, so the order can be tested without mutating process
//! state. The API token never appears in Debug output or error messages.

use std::collections::HashMap;

use crate::error::{DocpackError, Result};

/// Environment variable names consulted during resolution.
pub const ENV_CONTENT_BASE_URL: &str = "CONFLUENCE_BASE_URL";
pub const ENV_ISSUE_BASE_URL: &str = "JIRA_BASE_URL";
pub const ENV_EMAIL: &str = "ATLASSIAN_EMAIL";
pub const ENV_API_TOKEN: &str = "ATLASSIAN_API_TOKEN";
pub const ENV_TENANT_DOMAIN: &str = "ATLASSIAN_DOMAIN";

/// Per-request credential overrides, all optional.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOverrides {
    pub confluence_base_url: Option<String>,
    pub jira_base_url: Option<String>,
    pub atlassian_domain: Option<String>,
    pub atlassian_email: Option<String>,
    pub atlassian_api_token: Option<String>,
}

/// Fully resolved credentials and base URLs for both downstream systems.
#[derive(Clone)]
pub struct PublishTargets {
    pub content_base_url: String,
    pub issue_base_url: String,
    pub email: String,
    pub api_token: String,
}

impl std::fmt::Debug for PublishTargets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishTargets")
            .field("content_base_url", &self.content_base_url)
            .field("issue_base_url", &self.issue_base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Resolve each field as: explicit request value → environment variable →
/// (base URLs only) derived from the tenant domain. Fails naming exactly the
/// fields that are still missing.
pub fn resolve_publish_targets(
    overrides: &PublishOverrides,
    env: &HashMap<String, String>,
) -> Result<PublishTargets> {
    let from_env = |key: &str| -> Option<String> {
        env.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let explicit = |value: &Option<String>| -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let domain = explicit(&overrides.atlassian_domain).or_else(|| from_env(ENV_TENANT_DOMAIN));

    let content_base_url = explicit(&overrides.confluence_base_url)
        .or_else(|| from_env(ENV_CONTENT_BASE_URL))
        .or_else(|| domain.as_deref().map(|d| format!("https://{d}/wiki")));
    let issue_base_url = explicit(&overrides.jira_base_url)
        .or_else(|| from_env(ENV_ISSUE_BASE_URL))
        .or_else(|| domain.as_deref().map(|d| format!("https://{d}")));
    let email = explicit(&overrides.atlassian_email).or_else(|| from_env(ENV_EMAIL));
    let api_token = explicit(&overrides.atlassian_api_token).or_else(|| from_env(ENV_API_TOKEN));

    let mut missing = Vec::new();
    if content_base_url.is_none() {
        missing.push("content base URL");
    }
    if issue_base_url.is_none() {
        missing.push("issue base URL");
    }
    if email.is_none() {
        missing.push("email");
    }
    if api_token.is_none() {
        missing.push("API token");
    }
    if !missing.is_empty() {
        return Err(DocpackError::Configuration(format!(
            "publish credentials incomplete: missing {}",
            missing.join(", ")
        )));
    }

    let strip = |url: String| url.trim_end_matches('/').to_string();
    Ok(PublishTargets {
        content_base_url: strip(content_base_url.unwrap_or_default()),
        issue_base_url: strip(issue_base_url.unwrap_or_default()),
        email: email.unwrap_or_default(),
        api_token: api_token.unwrap_or_default(),
    })
}
