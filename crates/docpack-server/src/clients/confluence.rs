//! Client for the wiki-style content service: space lookup and hierarchical
//! page creation.

use docpack_core::config::PublishTargets;
use docpack_core::{DocpackError, DownstreamSystem, Result};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct ConfluenceClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A created page: its id and a browser-facing URL.
#[derive(Debug, Clone)]
pub struct PageRef {
    pub id: String,
    pub web_url: String,
}

#[derive(Debug)]
pub struct CreatePage<'a> {
    pub space_key: &'a str,
    pub title: String,
    pub html: String,
    pub parent_id: Option<String>,
}

impl ConfluenceClient {
    pub fn new(http: reqwest::Client, targets: &PublishTargets) -> Self {
        Self {
            http,
            base_url: targets.content_base_url.clone(),
            auth_header: super::basic_auth(&targets.email, &targets.api_token),
        }
    }

    /// Pre-flight existence/permission check. Returns `None` on any failure
    /// so the caller can produce a clearer "space not found" message.
    pub async fn get_space(&self, key: &str) -> Option<Space> {
        let response = self
            .http
            .get(format!("{}/rest/api/space/{key}", self.base_url))
            .header(AUTHORIZATION, self.auth_header.as_str())
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }

    /// Create a page; with `parent_id` set, the page becomes a child so the
    /// doc pack forms a tree.
    pub async fn create_page(&self, page: &CreatePage<'_>) -> Result<PageRef> {
        let mut body = json!({
            "type": "page",
            "title": page.title,
            "space": {"key": page.space_key},
            "body": {"storage": {"value": page.html, "representation": "storage"}},
        });
        if let Some(parent) = &page.parent_id {
            body["ancestors"] = json!([{"id": parent}]);
        }

        let response = self
            .http
            .post(format!("{}/rest/api/content", self.base_url))
            .header(AUTHORIZATION, self.auth_header.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| DocpackError::Unreachable {
                system: DownstreamSystem::Content,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| DocpackError::Unreachable {
            system: DownstreamSystem::Content,
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            return Err(DocpackError::downstream(
                DownstreamSystem::Content,
                status,
                &text,
            ));
        }

        let parsed: Value = serde_json::from_str(&text)
            .map_err(|_| DocpackError::downstream(DownstreamSystem::Content, status, &text))?;

        let id = match parsed.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(DocpackError::downstream(
                    DownstreamSystem::Content,
                    status,
                    &text,
                ))
            }
        };

        let links = parsed.get("_links");
        let link = |key: &str| -> Option<&str> { links.and_then(|l| l.get(key)).and_then(Value::as_str) };
        let web_url = format!(
            "{}{}",
            link("base").unwrap_or(&self.base_url),
            link("webui").unwrap_or("")
        );

        Ok(PageRef { id, web_url })
    }
}
