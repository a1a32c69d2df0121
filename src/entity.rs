//! Entity model
//!
//! Entities are parsed leniently from raw JSON records. The encyclopedia data
//! was authored by hand over years, so every field except `id` is optional
//! and relationship fields are kept as raw JSON for the extractor to walk.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical entity identifier (lowercase alphanumeric plus `-`/`_`)
pub type EntityId = String;

/// Known entity type vocabulary. Open-ended: data may carry types outside
/// this list and they are preserved as-is.
pub const KNOWN_ENTITY_TYPES: &[&str] = &[
    "deity",
    "hero",
    "creature",
    "item",
    "place",
    "text",
    "ritual",
    "symbol",
    "herb",
    "cosmology",
    "concept",
    "event",
    "archetype",
    "magic",
    "being",
];

/// Plural category-folder names mapped to their singular entity type.
/// Covers the vocabulary above; anything else falls back to suffix rules.
const PLURAL_TYPES: &[(&str, &str)] = &[
    ("deities", "deity"),
    ("heroes", "hero"),
    ("creatures", "creature"),
    ("items", "item"),
    ("places", "place"),
    ("texts", "text"),
    ("rituals", "ritual"),
    ("symbols", "symbol"),
    ("herbs", "herb"),
    ("cosmologies", "cosmology"),
    ("concepts", "concept"),
    ("events", "event"),
    ("archetypes", "archetype"),
    ("magic", "magic"),
    ("beings", "being"),
];

/// Singularize a category-folder name ("deities" -> "deity").
pub fn singularize_type(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some((_, singular)) = PLURAL_TYPES.iter().find(|(plural, _)| *plural == lower) {
        return (*singular).to_string();
    }
    if let Some(stem) = lower.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    lower.strip_suffix('s').map(str::to_string).unwrap_or(lower)
}

/// A single mythological record (deity, hero, item, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique, stable identifier
    pub id: EntityId,

    /// Display name
    pub name: String,

    /// Entity type (open vocabulary, see [`KNOWN_ENTITY_TYPES`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Explicit mythology/tradition tag, if the record declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Declared domain list (first element is primary)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,

    /// Free-text facet terms used for similarity scoring
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    /// Where this record came from (file path or source label)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// The full raw record. Relationship fields are walked from here by the
    /// reference extractor; legacy shapes are too irregular to type up front.
    #[serde(skip)]
    pub raw: Value,
}

impl Entity {
    /// Parse an entity from a raw JSON record. Returns `None` when the
    /// record has no usable `id` (the caller records a load issue).
    pub fn from_value(value: Value, origin: Option<String>) -> Option<Self> {
        let obj = value.as_object()?;

        let id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .to_string();

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());

        let entity_type = obj
            .get("entityType")
            .or_else(|| obj.get("type"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_lowercase());

        let domain = obj
            .get("domain")
            .or_else(|| obj.get("mythology"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_lowercase());

        Some(Self {
            id,
            name,
            entity_type,
            domain,
            domains: string_array(obj.get("domains")),
            tags: string_array(obj.get("tags")),
            symbols: string_array(obj.get("symbols")),
            attributes: string_array(obj.get("attributes")),
            origin,
            raw: value,
        })
    }

    /// Lowercased term set for similarity scoring: domains, symbols and
    /// attributes. Name normalization is separate and lives in the index.
    pub fn similarity_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self
            .domains
            .iter()
            .chain(self.symbols.iter())
            .chain(self.attributes.iter())
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        terms.sort();
        terms.dedup();
        terms
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
