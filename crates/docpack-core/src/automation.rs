//! The unit of exchange between the orchestrator and its caller: the parsed,
//! normalized automation result, plus the JSON parse-with-repair step that
//! turns raw completion text into something the normalizers can work on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backlog::Backlog;
use crate::document::{ensure_doc_has_content, StructuredDocument};
use crate::raid::RaidLog;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationMeta {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub jira_project_key: String,
    #[serde(default)]
    pub confluence_space_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationDocs {
    pub brd: StructuredDocument,
    pub frs: StructuredDocument,
    pub sow: StructuredDocument,
    pub raid: RaidLog,
    #[serde(default)]
    pub backlog_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationNotes {
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub open_questions: Vec<String>,
}

/// Lifetime is one request; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationResult {
    pub meta: AutomationMeta,
    pub docs: AutomationDocs,
    pub backlog: Backlog,
    pub notes: AutomationNotes,
    /// Raw completion text, kept only when it could not be parsed as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request-sourced values used to backfill `meta` and title the documents.
#[derive(Debug, Clone, Default)]
pub struct MetaDefaults {
    pub project_name: String,
    pub jira_project_key: String,
    pub confluence_space_key: String,
}

// ---------------------------------------------------------------------------
// Parse with repair
// ---------------------------------------------------------------------------

/// Parse completion text as JSON, tolerating markdown fences and prose
/// around the object. Returns the parsed value, or `(empty object, raw
/// text)` when nothing parseable was found — the caller continues with
/// normalization either way.
pub fn parse_completion(text: &str) -> (Value, Option<String>) {
    let candidate = strip_fences(text);
    if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
        return (v, None);
    }
    // Fall back to the outermost brace pair of the original text: models
    // sometimes preface the object with prose even in JSON mode.
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(&text[start..=end]) {
                return (v, None);
            }
        }
    }
    (Value::Object(Default::default()), Some(text.to_string()))
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline, and the
    // closing fence if present.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.rsplit_once("```").map_or(rest, |(body, _)| body).trim()
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

impl AutomationResult {
    /// Build a normalized result from raw completion text. Every document is
    /// guaranteed valid afterwards regardless of how malformed the
    /// completion was; an unparseable completion is retained under `error`.
    pub fn from_completion(text: &str, defaults: &MetaDefaults, source_text: &str) -> Self {
        let (value, parse_error) = parse_completion(text);

        let mut meta: AutomationMeta = value
            .get("meta")
            .cloned()
            .and_then(|m| serde_json::from_value(m).ok())
            .unwrap_or_default();
        if meta.project_name.trim().is_empty() {
            meta.project_name = defaults.project_name.clone();
        }
        if meta.jira_project_key.trim().is_empty() {
            meta.jira_project_key = defaults.jira_project_key.clone();
        }
        if meta.confluence_space_key.trim().is_empty() {
            meta.confluence_space_key = defaults.confluence_space_key.clone();
        }

        let docs_value = value.get("docs");
        let doc = |key: &str, label: &str| -> StructuredDocument {
            ensure_doc_has_content(
                docs_value.and_then(|d| d.get(key)),
                &format!("{label} — {}", meta.project_name),
                source_text,
            )
        };

        let docs = AutomationDocs {
            brd: doc("brd", "Business Requirements Document"),
            frs: doc("frs", "Functional Requirements Specification"),
            sow: doc("sow", "Statement of Work"),
            raid: RaidLog::from_value(
                docs_value.and_then(|d| d.get("raid")),
                &format!("RAID Log — {}", meta.project_name),
            ),
            backlog_summary: docs_value
                .and_then(|d| d.get("backlogSummary"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        };

        let backlog = Backlog::from_value(value.get("backlog"));
        let notes: AutomationNotes = value
            .get("notes")
            .cloned()
            .and_then(|n| serde_json::from_value(n).ok())
            .unwrap_or_default();

        AutomationResult {
            meta,
            docs,
            backlog,
            notes,
            error: parse_error,
        }
    }
}
