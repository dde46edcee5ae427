//! RAID log (risks, assumptions, issues, dependencies) coercion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaidEntry {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

/// The four sequences are always present after coercion, never null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaidLog {
    pub title: String,
    #[serde(default)]
    pub risks: Vec<RaidEntry>,
    #[serde(default)]
    pub assumptions: Vec<RaidEntry>,
    #[serde(default)]
    pub issues: Vec<RaidEntry>,
    #[serde(default)]
    pub dependencies: Vec<RaidEntry>,
}

impl RaidLog {
    /// Coerce a raw model value into a RAID log. Absent or malformed arrays
    /// become empty sequences; string entries become `{item}` records.
    pub fn from_value(raw: Option<&Value>, fallback_title: &str) -> RaidLog {
        let obj = raw.and_then(Value::as_object);

        let title = obj
            .and_then(|o| o.get("title"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(fallback_title)
            .to_string();

        let entries = |key: &str| -> Vec<RaidEntry> {
            obj.and_then(|o| o.get(key))
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(coerce_entry).collect())
                .unwrap_or_default()
        };

        RaidLog {
            title,
            risks: entries("risks"),
            assumptions: entries("assumptions"),
            issues: entries("issues"),
            dependencies: entries("dependencies"),
        }
    }
}

fn coerce_entry(value: &Value) -> Option<RaidEntry> {
    match value {
        Value::String(s) => {
            let item = s.trim();
            (!item.is_empty()).then(|| RaidEntry {
                item: item.to_string(),
                ..RaidEntry::default()
            })
        }
        Value::Object(o) => {
            let text = |key: &str| -> String {
                o.get(key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or("")
                    .to_string()
            };
            let mitigation = o
                .get("mitigation")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            Some(RaidEntry {
                item: text("item"),
                owner: text("owner"),
                status: text("status"),
                mitigation,
            })
        }
        _ => None,
    }
}
