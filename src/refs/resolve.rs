//! Reference Resolver
//!
//! Maps a raw reference to a concrete target entity id through an ordered
//! fallback chain. The order exists because the data was authored under
//! three incompatible referencing conventions; a single-strategy resolver
//! produces excessive false-positive broken links. Do not reorder.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId};
use crate::index::{normalize_name, EntityIndex};

use super::{candidate_from_path, RawReference};

/// Resolution strategies, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Exact id lookup
    ExactId,
    /// `{source.domain}_{id}` lookup for domain-scoped legacy ids
    DomainPrefixedId,
    /// Normalized display-name lookup
    NormalizedName,
    /// Membership scan within the referenced type's id list
    TypeScopedId,
}

impl Strategy {
    pub fn confidence(self) -> f64 {
        match self {
            Strategy::ExactId => 1.0,
            Strategy::DomainPrefixedId => 0.9,
            Strategy::NormalizedName => 0.7,
            Strategy::TypeScopedId => 0.5,
        }
    }
}

/// Outcome of resolving one raw reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// Resolved target id, if any strategy matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityId>,
    /// The strategy that matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    /// Every strategy attempted, for diagnostics
    pub attempted: Vec<Strategy>,
    pub confidence: f64,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    fn hit(target: EntityId, strategy: Strategy, attempted: Vec<Strategy>) -> Self {
        Self {
            target: Some(target),
            strategy: Some(strategy),
            confidence: strategy.confidence(),
            attempted,
        }
    }

    fn miss(attempted: Vec<Strategy>) -> Self {
        Self {
            target: None,
            strategy: None,
            attempted,
            confidence: 0.0,
        }
    }
}

/// Resolve a raw reference against the indices. First match wins.
pub fn resolve(raw: &RawReference, source: &Entity, index: &EntityIndex) -> Resolution {
    let candidate = candidate_id(raw);
    let name = candidate_name(raw);
    let type_hint = match raw {
        RawReference::Object { entity_type, .. } => entity_type.as_deref(),
        _ => None,
    };
    let source_domain = index.domain_of(&source.id);

    let mut attempted = Vec::with_capacity(4);

    // 1. Exact id
    if let Some(candidate) = candidate.as_deref() {
        attempted.push(Strategy::ExactId);
        if index.contains(candidate) {
            return Resolution::hit(candidate.to_string(), Strategy::ExactId, attempted);
        }

        // 2. Domain-scoped legacy id missing its prefix
        if let Some(domain) = source_domain {
            let prefixed = format!("{}_{}", domain, candidate);
            if !candidate.starts_with(&format!("{}_", domain)) {
                attempted.push(Strategy::DomainPrefixedId);
                if index.contains(&prefixed) {
                    return Resolution::hit(prefixed, Strategy::DomainPrefixedId, attempted);
                }
            }
        }
    }

    // 3. Normalized name
    if let Some(name) = name.as_deref() {
        let normalized = normalize_name(name);
        if !normalized.is_empty() {
            attempted.push(Strategy::NormalizedName);
            let matches = index.ids_by_normalized_name(&normalized);
            if !matches.is_empty() {
                // Prefer a same-domain match when names collide
                let target = matches
                    .iter()
                    .find(|id| index.domain_of(id.as_str()) == source_domain)
                    .unwrap_or(&matches[0]);
                return Resolution::hit(target.clone(), Strategy::NormalizedName, attempted);
            }
        }
    }

    // 4. Type-scoped membership: an id fragment that identifies exactly
    // one entity of the declared type (e.g. {type: "deity", id: "zeus"})
    if let (Some(type_hint), Some(candidate)) = (type_hint, candidate.as_deref()) {
        attempted.push(Strategy::TypeScopedId);
        let suffix = format!("_{}", candidate);
        if let Some(target) = index
            .ids_of_type(type_hint)
            .iter()
            .find(|id| id.as_str() == candidate || id.ends_with(&suffix))
        {
            return Resolution::hit(target.clone(), Strategy::TypeScopedId, attempted);
        }
    }

    Resolution::miss(attempted)
}

/// The id candidate a raw reference offers, if any
fn candidate_id(raw: &RawReference) -> Option<String> {
    match raw {
        RawReference::Id(s) => Some(s.clone()),
        RawReference::Path(p) => Some(candidate_from_path(p).unwrap_or_else(|| p.clone())),
        RawReference::Object { id, .. } => id.clone(),
    }
}

/// The name candidate for normalized-name fallback
fn candidate_name(raw: &RawReference) -> Option<String> {
    match raw {
        // A bare string might be a display name rather than an id
        RawReference::Id(s) => Some(s.clone()),
        RawReference::Path(_) => None,
        RawReference::Object { name, .. } => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DEFAULT_KNOWN_DOMAINS;
    use crate::store::{EntityStore, RawEntityRecord};
    use serde_json::json;

    fn fixture_index() -> (EntityStore, EntityIndex) {
        let store = EntityStore::from_records(vec![
            RawEntityRecord::new(
                "a.json",
                json!({"id": "greek_zeus", "name": "Zeus", "entityType": "deity"}),
            ),
            RawEntityRecord::new(
                "b.json",
                json!({"id": "greek_perseus", "name": "Perseus", "entityType": "hero"}),
            ),
            RawEntityRecord::new(
                "c.json",
                json!({"id": "norse_odin", "name": "Odin", "entityType": "deity"}),
            ),
        ]);
        let known: Vec<String> = DEFAULT_KNOWN_DOMAINS.iter().map(|s| s.to_string()).collect();
        let index = EntityIndex::build(&store, &known);
        (store, index)
    }

    fn source(index: &EntityIndex, id: &str) -> Entity {
        index.get(id).unwrap().as_ref().clone()
    }

    #[test]
    fn test_exact_id_wins_first() {
        let (_store, index) = fixture_index();
        let src = source(&index, "greek_perseus");
        let res = resolve(&RawReference::Id("greek_zeus".to_string()), &src, &index);
        assert_eq!(res.target.as_deref(), Some("greek_zeus"));
        assert_eq!(res.strategy, Some(Strategy::ExactId));
        assert_eq!(res.attempted, vec![Strategy::ExactId]);
    }

    #[test]
    fn test_domain_prefix_fallback() {
        let (_store, index) = fixture_index();
        let src = source(&index, "greek_perseus");
        let res = resolve(&RawReference::Id("zeus".to_string()), &src, &index);
        assert_eq!(res.target.as_deref(), Some("greek_zeus"));
        assert_eq!(res.strategy, Some(Strategy::DomainPrefixedId));
        assert!(res.attempted.contains(&Strategy::ExactId));
    }

    #[test]
    fn test_normalized_name_fallback() {
        let (_store, index) = fixture_index();
        let src = source(&index, "greek_perseus");
        let raw = RawReference::Object {
            id: None,
            name: Some("Odin".to_string()),
            entity_type: None,
            domain: None,
            relationship: None,
        };
        let res = resolve(&raw, &src, &index);
        assert_eq!(res.target.as_deref(), Some("norse_odin"));
        assert_eq!(res.strategy, Some(Strategy::NormalizedName));
    }

    #[test]
    fn test_type_scoped_fallback() {
        let (_store, index) = fixture_index();
        let src = source(&index, "greek_perseus");
        let raw = RawReference::Object {
            id: Some("odin".to_string()),
            name: None,
            entity_type: Some("deity".to_string()),
            domain: None,
            relationship: None,
        };
        let res = resolve(&raw, &src, &index);
        assert_eq!(res.target.as_deref(), Some("norse_odin"));
        assert_eq!(res.strategy, Some(Strategy::TypeScopedId));
    }

    #[test]
    fn test_unresolved_records_attempts() {
        let (_store, index) = fixture_index();
        let src = source(&index, "greek_perseus");
        let res = resolve(&RawReference::Id("nonexistent_entity_123".to_string()), &src, &index);
        assert!(!res.is_resolved());
        assert_eq!(res.confidence, 0.0);
        assert!(res.attempted.len() >= 2);
    }

    #[test]
    fn test_path_ref_resolves_via_extracted_candidate() {
        let store = EntityStore::from_records(vec![
            RawEntityRecord::new("a.json", json!({"id": "greek_deity_zeus", "name": "Zeus"})),
            RawEntityRecord::new("b.json", json!({"id": "greek_perseus", "name": "Perseus"})),
        ]);
        let known: Vec<String> = DEFAULT_KNOWN_DOMAINS.iter().map(|s| s.to_string()).collect();
        let index = EntityIndex::build(&store, &known);
        let src = index.get("greek_perseus").unwrap().as_ref().clone();

        let raw = RawReference::Path("../../greek/deities/zeus.html".to_string());
        let res = resolve(&raw, &src, &index);
        assert_eq!(res.target.as_deref(), Some("greek_deity_zeus"));
        assert_eq!(res.strategy, Some(Strategy::ExactId));
    }
}
