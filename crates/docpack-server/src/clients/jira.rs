//! Client for the issue tracker: epic/story creation and the three-tier
//! epic-linking strategy (tracker installations differ in how epic linkage
//! is modeled).

use std::sync::Arc;

use docpack_core::backlog::{BacklogEpic, BacklogStory};
use docpack_core::config::PublishTargets;
use docpack_core::{DocpackError, DownstreamSystem, Result};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// The field catalog is searched for this exact name.
const EPIC_LINK_FIELD_NAME: &str = "Epic Link";

pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    auth_header: String,
    /// Shared process-wide cache; see `AppState::epic_link_field`.
    epic_link_field: Arc<OnceCell<Option<String>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueRef {
    pub id: String,
    pub key: String,
}

/// How a story ended up associated with its epic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Direct parent reference (newer project configurations).
    Parent,
    /// "Epic Link" custom field (legacy configurations).
    EpicLinkField,
    /// Created without linkage.
    Unlinked,
}

pub struct StorySpec<'a> {
    pub project_key: &'a str,
    pub epic_key: Option<&'a str>,
    pub summary: String,
    pub description: Value,
    pub labels: &'a [String],
}

impl JiraClient {
    pub fn new(
        http: reqwest::Client,
        targets: &PublishTargets,
        epic_link_field: Arc<OnceCell<Option<String>>>,
    ) -> Self {
        Self {
            http,
            base_url: targets.issue_base_url.clone(),
            auth_header: super::basic_auth(&targets.email, &targets.api_token),
            epic_link_field,
        }
    }

    /// Create one issue from an opaque fields object.
    pub async fn create_issue(&self, fields: Value) -> Result<IssueRef> {
        let response = self
            .http
            .post(format!("{}/rest/api/3/issue", self.base_url))
            .header(AUTHORIZATION, self.auth_header.as_str())
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| DocpackError::Unreachable {
                system: DownstreamSystem::Issues,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| DocpackError::Unreachable {
            system: DownstreamSystem::Issues,
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            return Err(DocpackError::downstream(
                DownstreamSystem::Issues,
                status,
                &text,
            ));
        }

        serde_json::from_str(&text)
            .map_err(|_| DocpackError::downstream(DownstreamSystem::Issues, status, &text))
    }

    /// The id of the "Epic Link" custom field, if this installation has one.
    /// The catalog is fetched at most once per process; fetch failures are
    /// not cached so a later request can retry.
    pub async fn epic_link_field_id(&self) -> Option<String> {
        if let Some(cached) = self.epic_link_field.get() {
            return cached.clone();
        }
        match self.fetch_epic_link_field().await {
            Ok(found) => {
                let _ = self.epic_link_field.set(found.clone());
                found
            }
            Err(err) => {
                warn!(error = %err, "field catalog fetch failed; skipping epic-link fallback");
                None
            }
        }
    }

    async fn fetch_epic_link_field(&self) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct FieldDef {
            id: String,
            name: String,
        }

        let response = self
            .http
            .get(format!("{}/rest/api/3/field", self.base_url))
            .header(AUTHORIZATION, self.auth_header.as_str())
            .send()
            .await
            .map_err(|e| DocpackError::Unreachable {
                system: DownstreamSystem::Issues,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| DocpackError::Unreachable {
            system: DownstreamSystem::Issues,
            message: e.to_string(),
        })?;
        if !(200..300).contains(&status) {
            return Err(DocpackError::downstream(
                DownstreamSystem::Issues,
                status,
                &text,
            ));
        }

        let fields: Vec<FieldDef> = serde_json::from_str(&text)
            .map_err(|_| DocpackError::downstream(DownstreamSystem::Issues, status, &text))?;
        Ok(fields
            .into_iter()
            .find(|f| f.name == EPIC_LINK_FIELD_NAME)
            .map(|f| f.id))
    }

    /// Create a story, associating it with its epic via an ordered list of
    /// linking strategies: stop at the first that succeeds; only the final
    /// strategy's failure surfaces.
    pub async fn create_story(&self, spec: StorySpec<'_>) -> Result<(IssueRef, LinkMode)> {
        let base = json!({
            "project": {"key": spec.project_key},
            "issuetype": {"name": "Story"},
            "summary": spec.summary,
            "description": spec.description,
            "labels": spec.labels,
        });

        let strategies: &[LinkMode] = if spec.epic_key.is_some() {
            &[LinkMode::Parent, LinkMode::EpicLinkField, LinkMode::Unlinked]
        } else {
            &[LinkMode::Unlinked]
        };

        let mut last_err = None;
        for (i, strategy) in strategies.iter().enumerate() {
            let Some(fields) = self.fields_for(*strategy, spec.epic_key, &base).await else {
                continue;
            };
            match self.create_issue(fields).await {
                Ok(issue) => {
                    debug!(key = %issue.key, mode = ?strategy, "story created");
                    return Ok((issue, *strategy));
                }
                Err(err) => {
                    if i + 1 < strategies.len() {
                        warn!(error = %err, mode = ?strategy, "story create failed; trying next linking strategy");
                    }
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            DocpackError::Validation("no linking strategy could be attempted".to_string())
        }))
    }

    /// The fields payload for one strategy, or `None` when the strategy is
    /// unavailable (no epic, or no "Epic Link" field on this installation).
    async fn fields_for(
        &self,
        strategy: LinkMode,
        epic_key: Option<&str>,
        base: &Value,
    ) -> Option<Value> {
        match strategy {
            LinkMode::Parent => {
                let mut fields = base.clone();
                fields["parent"] = json!({"key": epic_key?});
                Some(fields)
            }
            LinkMode::EpicLinkField => {
                let epic = epic_key?;
                let field_id = self.epic_link_field_id().await?;
                let mut fields = base.clone();
                fields[field_id] = json!(epic);
                Some(fields)
            }
            LinkMode::Unlinked => Some(base.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Field builders
// ---------------------------------------------------------------------------

/// Issue fields for an epic.
pub fn epic_fields(project_key: &str, epic: &BacklogEpic, labels: &[String]) -> Value {
    json!({
        "project": {"key": project_key},
        "issuetype": {"name": "Epic"},
        "summary": epic.name,
        "description": adf_doc(&[AdfBlock::Paragraph(epic.description.clone())]),
        "labels": labels,
    })
}

/// Rich-text story description: story text, an "Acceptance Criteria" bullet
/// list, and (when the doc pack was published) a back-link to it.
pub fn story_description(story: &BacklogStory, doc_pack_url: Option<&str>) -> Value {
    let mut blocks = vec![AdfBlock::Paragraph(story.story.clone())];
    if !story.acceptance_criteria.is_empty() {
        blocks.push(AdfBlock::Paragraph("Acceptance Criteria".to_string()));
        blocks.push(AdfBlock::BulletList(story.acceptance_criteria.clone()));
    }
    if let Some(url) = doc_pack_url {
        blocks.push(AdfBlock::Paragraph(format!("Doc pack: {url}")));
    }
    adf_doc(&blocks)
}

pub enum AdfBlock {
    Paragraph(String),
    BulletList(Vec<String>),
}

/// Minimal Atlassian-document-format document from plain blocks.
fn adf_doc(blocks: &[AdfBlock]) -> Value {
    let content: Vec<Value> = blocks
        .iter()
        .map(|block| match block {
            AdfBlock::Paragraph(text) => json!({
                "type": "paragraph",
                "content": [{"type": "text", "text": text}],
            }),
            AdfBlock::BulletList(items) => json!({
                "type": "bulletList",
                "content": items.iter().map(|item| json!({
                    "type": "listItem",
                    "content": [{
                        "type": "paragraph",
                        "content": [{"type": "text", "text": item}],
                    }],
                })).collect::<Vec<_>>(),
            }),
        })
        .collect();

    json!({"type": "doc", "version": 1, "content": content})
}
