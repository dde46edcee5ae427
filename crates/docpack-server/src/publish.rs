//! Publication pipeline: one parent page plus four document pages in the
//! content service, then epics and stories in the tracker, in a fixed order.
//! A failure aborts the remaining creates; already-created pages and issues
//! are left in place.

use std::collections::HashMap;

use docpack_core::automation::AutomationResult;
use docpack_core::config::PublishTargets;
use docpack_core::document::{unique_title, StructuredDocument};
use docpack_core::raid::{RaidEntry, RaidLog};
use docpack_core::{DocpackError, Result};
use serde::Serialize;
use tracing::info;

use crate::clients::confluence::{ConfluenceClient, CreatePage};
use crate::clients::jira::{epic_fields, story_description, JiraClient, StorySpec};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ConfluenceRefs {
    pub parent: String,
    pub brd: String,
    pub frs: String,
    pub sow: String,
    pub raid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JiraRefs {
    pub epics: Vec<String>,
    pub stories: Vec<String>,
}

/// Ephemeral identifiers of everything created during one publish run.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedRefs {
    pub confluence: ConfluenceRefs,
    pub jira: JiraRefs,
}

/// Inputs the pipeline needs beyond the automation result itself.
pub struct PublishRequest<'a> {
    pub space_key: &'a str,
    pub project_key: &'a str,
    pub labels: &'a [String],
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub async fn publish_result(
    state: &AppState,
    targets: &PublishTargets,
    output: &AutomationResult,
    req: &PublishRequest<'_>,
) -> Result<PublishedRefs> {
    let confluence = ConfluenceClient::new(state.http.clone(), targets);
    let jira = JiraClient::new(state.http.clone(), targets, state.epic_link_field.clone());

    // Pre-flight: a missing space is a caller mistake, not a downstream
    // failure, and must be reported before anything is created.
    if confluence.get_space(req.space_key).await.is_none() {
        return Err(DocpackError::Validation(format!(
            "Confluence space '{}' not found or not accessible — check the key \
             (personal spaces use the '~<account-id>' format)",
            req.space_key
        )));
    }

    let project = &output.meta.project_name;

    // Page tree: parent first, then the four documents as children.
    let parent = confluence
        .create_page(&CreatePage {
            space_key: req.space_key,
            title: unique_title(&format!("PM Doc Pack – {project}")),
            html: pack_overview_html(output),
            parent_id: None,
        })
        .await?;

    let child = |doc_title: &str, html: String| CreatePage {
        space_key: req.space_key,
        title: unique_title(doc_title),
        html,
        parent_id: Some(parent.id.clone()),
    };
    let brd = confluence
        .create_page(&child(&output.docs.brd.title, doc_html(&output.docs.brd)))
        .await?;
    let frs = confluence
        .create_page(&child(&output.docs.frs.title, doc_html(&output.docs.frs)))
        .await?;
    let sow = confluence
        .create_page(&child(&output.docs.sow.title, doc_html(&output.docs.sow)))
        .await?;
    let raid = confluence
        .create_page(&child(&output.docs.raid.title, raid_html(&output.docs.raid)))
        .await?;

    info!(parent = %parent.id, "doc pack pages created");

    // Epics in array order. Duplicate names overwrite the mapping: last
    // write wins.
    let mut epic_keys: HashMap<String, String> = HashMap::new();
    let mut epic_refs = Vec::new();
    for epic in &output.backlog.epics {
        let issue = jira
            .create_issue(epic_fields(req.project_key, epic, req.labels))
            .await?;
        epic_keys.insert(epic.name.clone(), issue.key.clone());
        epic_refs.push(issue.key);
    }

    // Stories in array order, after the epic map is fully populated.
    let mut story_refs = Vec::new();
    for story in &output.backlog.stories {
        let summary = if story.summary.trim().is_empty() {
            story.story.chars().take(120).collect()
        } else {
            story.summary.clone()
        };
        let (issue, _mode) = jira
            .create_story(StorySpec {
                project_key: req.project_key,
                epic_key: epic_keys.get(&story.epic_name).map(String::as_str),
                summary,
                description: story_description(story, Some(&parent.web_url)),
                labels: req.labels,
            })
            .await?;
        story_refs.push(issue.key);
    }

    info!(
        epics = epic_refs.len(),
        stories = story_refs.len(),
        "backlog issues created"
    );

    Ok(PublishedRefs {
        confluence: ConfluenceRefs {
            parent: parent.web_url,
            brd: brd.web_url,
            frs: frs.web_url,
            sow: sow.web_url,
            raid: raid.web_url,
        },
        jira: JiraRefs {
            epics: epic_refs,
            stories: story_refs,
        },
    })
}

// ---------------------------------------------------------------------------
// HTML rendering (storage representation)
// ---------------------------------------------------------------------------

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a structured document as heading/paragraph HTML.
pub fn doc_html(doc: &StructuredDocument) -> String {
    let mut html = String::new();
    for section in &doc.sections {
        html.push_str(&format!("<h2>{}</h2>", html_escape(&section.heading)));
        for para in section.body.split("\n\n") {
            html.push_str(&format!("<p>{}</p>", html_escape(para.trim())));
        }
    }
    html
}

/// Render the RAID log as four titled tables.
pub fn raid_html(raid: &RaidLog) -> String {
    let mut html = String::new();
    let categories: [(&str, &[RaidEntry]); 4] = [
        ("Risks", &raid.risks),
        ("Assumptions", &raid.assumptions),
        ("Issues", &raid.issues),
        ("Dependencies", &raid.dependencies),
    ];
    for (label, entries) in categories {
        html.push_str(&format!("<h2>{label}</h2>"));
        if entries.is_empty() {
            html.push_str("<p>(none)</p>");
            continue;
        }
        html.push_str(
            "<table><tbody><tr><th>Item</th><th>Owner</th><th>Status</th><th>Mitigation</th></tr>",
        );
        for entry in entries {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(&entry.item),
                html_escape(&entry.owner),
                html_escape(&entry.status),
                html_escape(entry.mitigation.as_deref().unwrap_or("")),
            ));
        }
        html.push_str("</tbody></table>");
    }
    html
}

/// The parent page body: backlog summary plus the run's notes.
pub fn pack_overview_html(output: &AutomationResult) -> String {
    let mut html = format!(
        "<h2>Overview</h2><p>Generated document pack for {}.</p>",
        html_escape(&output.meta.project_name)
    );
    if !output.docs.backlog_summary.is_empty() {
        html.push_str(&format!(
            "<h2>Backlog Summary</h2><p>{}</p>",
            html_escape(&output.docs.backlog_summary)
        ));
    }
    for (label, items) in [
        ("Assumptions", &output.notes.assumptions),
        ("Open Questions", &output.notes.open_questions),
    ] {
        if items.is_empty() {
            continue;
        }
        html.push_str(&format!("<h2>{label}</h2><ul>"));
        for item in items {
            html.push_str(&format!("<li>{}</li>", html_escape(item)));
        }
        html.push_str("</ul>");
    }
    html
}
