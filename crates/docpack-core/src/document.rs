//! Structured documents (BRD/FRS/SOW) and the normalizer that guarantees
//! model output becomes a minimally valid document.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters of source text carried into the placeholder "Overview" section.
const OVERVIEW_EXCERPT_CHARS: usize = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One heading + body pair. Wire format uses `h` for the heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "h")]
    pub heading: String,
    pub body: String,
}

/// The normalized title + sections representation shared by BRD/FRS/SOW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub title: String,
    pub sections: Vec<Section>,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Coerce a raw (possibly malformed) document value into a valid
/// [`StructuredDocument`].
///
/// Guarantees: the result has a non-empty title and at least one section,
/// and every section has a non-empty heading and body. Content is never
/// dropped, only type-coerced; empty slots are filled with placeholders.
/// Running the normalizer on its own output is a no-op.
pub fn ensure_doc_has_content(
    raw: Option<&Value>,
    fallback_title: &str,
    source_text: &str,
) -> StructuredDocument {
    let obj = raw.and_then(Value::as_object);

    let raw_title = obj
        .and_then(|o| o.get("title"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    let title_was_empty = raw_title.is_empty();

    let mut title = if title_was_empty {
        fallback_title.trim().to_string()
    } else {
        raw_title.to_string()
    };
    if title.is_empty() {
        title = "Untitled Document".to_string();
    }

    let mut sections: Vec<Section> = obj
        .and_then(|o| o.get("sections"))
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(coerce_section).collect())
        .unwrap_or_default();

    let has_content = sections
        .iter()
        .any(|s| !s.heading.is_empty() || !s.body.is_empty());

    if sections.is_empty() || (title_was_empty && !has_content) {
        sections = placeholder_sections(source_text);
    } else {
        for (i, section) in sections.iter_mut().enumerate() {
            if section.heading.is_empty() {
                section.heading = format!("Section {}", i + 1);
            }
            if section.body.is_empty() {
                section.body = "(No content provided)".to_string();
            }
        }
    }

    StructuredDocument { title, sections }
}

fn coerce_section(value: &Value) -> Section {
    let obj = value.as_object();
    let field = |keys: &[&str]| -> String {
        obj.and_then(|o| keys.iter().find_map(|k| o.get(*k)))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("")
            .to_string()
    };
    Section {
        heading: field(&["h", "heading"]),
        body: field(&["body"]),
    }
}

fn placeholder_sections(source_text: &str) -> Vec<Section> {
    let excerpt: String = source_text.trim().chars().take(OVERVIEW_EXCERPT_CHARS).collect();
    let overview = if excerpt.is_empty() {
        "(No requirements provided)".to_string()
    } else {
        excerpt
    };
    vec![
        Section {
            heading: "Overview".to_string(),
            body: overview,
        },
        Section {
            heading: "Notes".to_string(),
            body: "This document was auto-generated because the source material \
                   did not contain enough structure to extract sections."
                .to_string(),
        },
    ]
}

// ---------------------------------------------------------------------------
// Title uniqueness
// ---------------------------------------------------------------------------

/// Append a filesystem/URL-safe ISO-8601 timestamp and a 4-hex-digit random
/// suffix so repeated runs against the same space never collide on title.
pub fn unique_title(base: &str) -> String {
    let timestamp = Utc::now().to_rfc3339().replace([':', '.'], "-");
    let suffix: u16 = rand::thread_rng().gen();
    format!("{base} {timestamp} {suffix:04x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_input_yields_placeholder_document() {
        let doc = ensure_doc_has_content(None, "BRD — Demo", "Build a login page");
        assert_eq!(doc.title, "BRD — Demo");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].heading, "Overview");
        assert!(doc.sections[0].body.contains("Build a login page"));
        assert_eq!(doc.sections[1].heading, "Notes");
    }

    #[test]
    fn non_object_input_is_treated_as_empty() {
        let raw = json!("not an object");
        let doc = ensure_doc_has_content(Some(&raw), "FRS — Demo", "");
        assert_eq!(doc.title, "FRS — Demo");
        assert_eq!(doc.sections[0].body, "(No requirements provided)");
    }

    #[test]
    fn title_and_sections_are_trimmed() {
        let raw = json!({
            "title": "  My Doc  ",
            "sections": [{"h": " Scope ", "body": " In scope. "}],
        });
        let doc = ensure_doc_has_content(Some(&raw), "fallback", "src");
        assert_eq!(doc.title, "My Doc");
        assert_eq!(doc.sections[0].heading, "Scope");
        assert_eq!(doc.sections[0].body, "In scope.");
    }

    #[test]
    fn non_string_section_values_become_placeholders() {
        let raw = json!({
            "title": "Doc",
            "sections": [{"h": 42, "body": "text"}, {"h": "Head", "body": null}],
        });
        let doc = ensure_doc_has_content(Some(&raw), "fallback", "");
        assert_eq!(doc.sections[0].heading, "Section 1");
        assert_eq!(doc.sections[0].body, "text");
        assert_eq!(doc.sections[1].heading, "Head");
        assert_eq!(doc.sections[1].body, "(No content provided)");
    }

    #[test]
    fn content_is_never_dropped() {
        let raw = json!({
            "title": "Doc",
            "sections": [
                {"h": "A", "body": "a"},
                {"h": "", "body": ""},
                {"h": "C", "body": "c"},
            ],
        });
        let doc = ensure_doc_has_content(Some(&raw), "fallback", "");
        assert_eq!(doc.sections.len(), 3);
    }

    #[test]
    fn empty_title_and_empty_sections_yield_exactly_two_placeholders() {
        let raw = json!({"title": "", "sections": [{"h": "", "body": ""}]});
        let doc = ensure_doc_has_content(Some(&raw), "SOW — Demo", "requirements here");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].heading, "Overview");
    }

    #[test]
    fn overview_excerpt_is_capped_at_1200_chars() {
        let long = "r".repeat(5000);
        let doc = ensure_doc_has_content(None, "Doc", &long);
        assert_eq!(doc.sections[0].body.chars().count(), 1200);
    }

    #[test]
    fn never_returns_empty_title_or_zero_sections() {
        let inputs = [
            None,
            Some(json!({})),
            Some(json!({"title": "   "})),
            Some(json!({"sections": []})),
            Some(json!({"title": "T", "sections": []})),
            Some(json!([1, 2, 3])),
        ];
        for raw in &inputs {
            let doc = ensure_doc_has_content(raw.as_ref(), "", "");
            assert!(!doc.title.is_empty(), "empty title for {raw:?}");
            assert!(!doc.sections.is_empty(), "zero sections for {raw:?}");
            for s in &doc.sections {
                assert!(!s.heading.is_empty());
                assert!(!s.body.is_empty());
            }
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            json!({"title": "Doc", "sections": [{"h": "A", "body": "a"}, {"h": "", "body": ""}]}),
            json!({"title": "", "sections": []}),
            json!({"title": "Only Title", "sections": [{"h": "", "body": "body only"}]}),
        ];
        for raw in &inputs {
            let once = ensure_doc_has_content(Some(raw), "Fallback", "source");
            let reserialized = serde_json::to_value(&once).unwrap();
            let twice = ensure_doc_has_content(Some(&reserialized), "Fallback", "source");
            assert_eq!(once, twice, "normalizer not idempotent for {raw}");
        }
    }

    #[test]
    fn unique_title_differs_across_calls() {
        let a = unique_title("PM Doc Pack – Demo");
        let b = unique_title("PM Doc Pack – Demo");
        assert_ne!(a, b);
        assert!(a.starts_with("PM Doc Pack – Demo "));
    }

    #[test]
    fn unique_title_has_no_colons_or_periods_in_suffix() {
        let t = unique_title("Base");
        let suffix = t.strip_prefix("Base ").unwrap();
        assert!(!suffix.contains(':'));
        assert!(!suffix.contains('.'));
    }
}
