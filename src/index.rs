//! Index Builder
//!
//! Builds the four lookup indices used during resolution and validation:
//! by-id, by-type, by-domain and by-normalized-name. Built once per run
//! from a fully loaded store; read-only afterwards, so the validation
//! phase can share it across threads without locking.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::entity::{Entity, EntityId};
use crate::store::EntityStore;

/// Default known-domain vocabulary for id-prefix inference
pub const DEFAULT_KNOWN_DOMAINS: &[&str] = &[
    "greek",
    "roman",
    "norse",
    "egyptian",
    "celtic",
    "slavic",
    "hindu",
    "buddhist",
    "chinese",
    "japanese",
    "korean",
    "sumerian",
    "babylonian",
    "persian",
    "christian",
    "jewish",
    "islamic",
    "aztec",
    "mayan",
    "incan",
    "yoruba",
    "polynesian",
    "aboriginal",
    "inuit",
];

/// Normalize a display name for fuzzy resolution: lowercase, strip
/// punctuation, collapse whitespace. Never used for identity.
pub fn normalize_name(name: &str) -> String {
    static PUNCT: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let punct = PUNCT.get_or_init(|| Regex::new(r"[^a-z0-9\s]").unwrap());
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());

    let lowered = name.to_lowercase();
    let stripped = punct.replace_all(&lowered, "");
    spaces.replace_all(stripped.trim(), " ").to_string()
}

/// Fuzzy name search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: EntityId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub score: i64,
}

/// The four lookup indices over a loaded entity store
#[derive(Debug, Default)]
pub struct EntityIndex {
    /// Every entity with a non-null id appears here exactly once
    by_id: HashMap<EntityId, Arc<Entity>>,

    /// entity_type -> ids carrying that type
    by_type: HashMap<String, Vec<EntityId>>,

    /// inferred domain -> ids; entities with no inferable domain are absent
    by_domain: HashMap<String, Vec<EntityId>>,

    /// normalized name -> ids (names can collide!)
    by_normalized_name: HashMap<String, Vec<EntityId>>,

    /// id -> inferred domain, cached so validation never re-infers
    domain_of: HashMap<EntityId, String>,

    known_domains: Vec<String>,
}

impl EntityIndex {
    /// Build all indices in one O(n) pass. Pure: the store is not touched.
    pub fn build(store: &EntityStore, known_domains: &[String]) -> Self {
        let n = store.len();
        let mut index = Self {
            by_id: HashMap::with_capacity(n),
            by_type: HashMap::new(),
            by_domain: HashMap::new(),
            by_normalized_name: HashMap::with_capacity(n),
            domain_of: HashMap::with_capacity(n),
            known_domains: known_domains.iter().map(|d| d.to_lowercase()).collect(),
        };

        for entity in store.entities() {
            index.by_id.insert(entity.id.clone(), Arc::clone(entity));

            if let Some(ty) = &entity.entity_type {
                index
                    .by_type
                    .entry(ty.clone())
                    .or_default()
                    .push(entity.id.clone());
            }

            if let Some(domain) = index.infer_domain(entity) {
                index
                    .by_domain
                    .entry(domain.clone())
                    .or_default()
                    .push(entity.id.clone());
                index.domain_of.insert(entity.id.clone(), domain);
            }

            let normalized = normalize_name(&entity.name);
            if !normalized.is_empty() {
                index
                    .by_normalized_name
                    .entry(normalized)
                    .or_default()
                    .push(entity.id.clone());
            }
        }

        index
    }

    /// Inference order: explicit `domain` field, then `domains[0]`, then a
    /// known-domain prefix on the id (`greek_...`). No match means no
    /// domain: the entity stays out of `by_domain`.
    fn infer_domain(&self, entity: &Entity) -> Option<String> {
        if let Some(domain) = &entity.domain {
            return Some(domain.to_lowercase());
        }
        if let Some(first) = entity.domains.first() {
            return Some(first.to_lowercase());
        }
        self.known_domains
            .iter()
            .find(|d| entity.id.starts_with(&format!("{}_", d)))
            .cloned()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Entity>> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Inferred domain for an entity, if any
    pub fn domain_of(&self, id: &str) -> Option<&str> {
        self.domain_of.get(id).map(String::as_str)
    }

    pub fn ids_of_type(&self, entity_type: &str) -> &[EntityId] {
        self.by_type
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn ids_in_domain(&self, domain: &str) -> &[EntityId] {
        self.by_domain
            .get(domain)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn ids_by_normalized_name(&self, normalized: &str) -> &[EntityId] {
        self.by_normalized_name
            .get(normalized)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All domains that have at least one entity
    pub fn domains(&self) -> impl Iterator<Item = &String> {
        self.by_domain.keys()
    }

    pub fn entity_count(&self) -> usize {
        self.by_id.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.by_id.values()
    }

    /// Fuzzy search over entity names, for CLI diagnostics
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let matcher = SkimMatcherV2::default();
        let mut hits: Vec<SearchHit> = self
            .by_id
            .values()
            .filter_map(|entity| {
                let score = matcher.fuzzy_match(&entity.name, query)?;
                Some(SearchHit {
                    id: entity.id.clone(),
                    name: entity.name.clone(),
                    domain: self.domain_of(&entity.id).map(str::to_string),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        hits
    }
}
