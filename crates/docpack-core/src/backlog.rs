//! Backlog model: epics and stories extracted from the completion output.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Story points are constrained to the planning-poker scale.
pub const LEGAL_STORY_POINTS: [u8; 6] = [1, 2, 3, 5, 8, 13];

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::P2
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::DocpackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P0" => Ok(Priority::P0),
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            other => Err(crate::DocpackError::Validation(format!(
                "invalid priority '{other}': expected one of P0, P1, P2, P3"
            ))),
        }
    }
}

/// Tolerant deserializer: sloppy model output falls back to the default
/// rather than failing the whole backlog.
fn de_priority<'de, D: Deserializer<'de>>(de: D) -> Result<Priority, D::Error> {
    let v = Value::deserialize(de)?;
    Ok(v.as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Story points
// ---------------------------------------------------------------------------

/// Snap an arbitrary numeric estimate to the nearest legal story-point value.
pub fn coerce_story_points(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 3;
    }
    LEGAL_STORY_POINTS
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (f64::from(*a) - raw).abs();
            let db = (f64::from(*b) - raw).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(3)
}

fn de_story_points<'de, D: Deserializer<'de>>(de: D) -> Result<u8, D::Error> {
    let v = Value::deserialize(de)?;
    let raw = match &v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(raw.map(coerce_story_points).unwrap_or(3))
}

fn default_story_points() -> u8 {
    3
}

/// Keep string entries, stringify bare numbers, drop the rest.
fn de_string_vec<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    let v = Value::deserialize(de)?;
    Ok(v.as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Epics and stories
// ---------------------------------------------------------------------------

/// Identity key is `name`: duplicate names collapse to one created issue
/// (last write wins) when published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacklogEpic {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogStory {
    #[serde(default)]
    pub epic_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub story: String,
    #[serde(default, deserialize_with = "de_string_vec")]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, deserialize_with = "de_priority")]
    pub priority: Priority,
    #[serde(default = "default_story_points", deserialize_with = "de_story_points")]
    pub story_points: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backlog {
    #[serde(default)]
    pub epics: Vec<BacklogEpic>,
    #[serde(default)]
    pub stories: Vec<BacklogStory>,
}

impl Backlog {
    /// Coerce a raw model value into a backlog; malformed input yields an
    /// empty backlog rather than an error.
    pub fn from_value(raw: Option<&Value>) -> Backlog {
        raw.cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}
