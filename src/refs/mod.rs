//! Relationship References
//!
//! The encyclopedia's relationship fields were authored across years under
//! three incompatible conventions: bare id strings, legacy HTML path
//! strings, and objects carrying some subset of `{id, name, type, domain,
//! link, relationship}`. Everything downstream of extraction works on a
//! single tagged union, [`RawReference`], produced by [`classify_value`] —
//! the resolver never shape-sniffs JSON.

pub mod extract;
pub mod resolve;

pub use extract::{candidate_from_path, extract};
pub use resolve::{resolve, Resolution, Strategy};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityId;

/// One relationship entry in its raw authored shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawReference {
    /// Bare string id, e.g. `"greek_zeus"` or `"zeus"`
    Id(String),
    /// Legacy path-like string, e.g. `"../../greek/deities/zeus.html"`
    Path(String),
    /// Object form with partial keys
    Object {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        entity_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        domain: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        relationship: Option<String>,
    },
}

impl RawReference {
    /// True for shapes the modern convention considers legacy (anything
    /// that is not an `{id, name}` object)
    pub fn is_legacy_shape(&self) -> bool {
        !matches!(self, RawReference::Object { .. })
    }

    /// The reference as given, for findings and reports
    pub fn display(&self) -> String {
        match self {
            RawReference::Id(s) | RawReference::Path(s) => s.clone(),
            RawReference::Object { id, name, .. } => id
                .clone()
                .or_else(|| name.clone())
                .unwrap_or_else(|| "<object>".to_string()),
        }
    }
}

/// A normalized view of one relationship entry, before resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub source_id: EntityId,
    /// Dotted field path, e.g. `"relatedEntities.heroes"` or `"allies"`
    pub field: String,
    pub raw: RawReference,
}

/// Classify one JSON value as a reference, or drop it.
///
/// `null`, empty strings and objects with none of the recognized keys are
/// garbage entries: dropped, never errored.
pub fn classify_value(value: &Value) -> Option<RawReference> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if looks_like_path(s) {
                Some(RawReference::Path(s.to_string()))
            } else {
                Some(RawReference::Id(s.to_string()))
            }
        }
        Value::Object(obj) => {
            let get = |key: &str| {
                obj.get(key)
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            let id = get("id");
            let name = get("name");
            if id.is_some() || name.is_some() {
                return Some(RawReference::Object {
                    id,
                    name,
                    entity_type: get("type").or_else(|| get("entityType")),
                    domain: get("domain").or_else(|| get("mythology")),
                    relationship: get("relationship"),
                });
            }

            // Object with only a link is a path ref in disguise
            get("link").map(RawReference::Path)
        }
        _ => None,
    }
}

fn looks_like_path(s: &str) -> bool {
    s.contains('/') || s.ends_with(".html") || s.ends_with(".htm")
}
