//! Link Validator
//!
//! For every extracted reference: resolve it, classify the outcome
//! (valid / broken / format issue / suspicious cross-domain), and check
//! bidirectional completeness where the field has a declared reverse
//! convention.
//!
//! Each entity's validation reads the shared immutable index and writes
//! only to its own local accumulators; the per-entity phase runs on a
//! rayon pool and results are merged in entity order afterwards.

pub mod findings;

pub use findings::{Finding, FindingCode, Findings, Severity};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::config::LinksConfig;
use crate::entity::Entity;
use crate::index::EntityIndex;
use crate::pipeline::RunBudget;
use crate::refs::{extract, resolve, Reference, Resolution};

/// Validation rules derived from configuration
#[derive(Debug, Clone)]
pub struct LinkRules {
    /// Symmetric whitelist of historically valid cross-domain pairs,
    /// stored as sorted lowercase tuples
    cross_domain_allowed: HashSet<(String, String)>,
    /// field -> expected reverse field, entered in both directions
    reverse_conventions: HashMap<String, String>,
}

impl LinkRules {
    pub fn from_config(config: &LinksConfig) -> Self {
        let mut cross_domain_allowed = HashSet::new();
        for (a, b) in &config.cross_domain_allowed {
            cross_domain_allowed.insert(domain_pair(a, b));
        }

        let mut reverse_conventions = HashMap::new();
        for (a, b) in &config.reverse_conventions {
            reverse_conventions.insert(a.clone(), b.clone());
            reverse_conventions.insert(b.clone(), a.clone());
        }

        Self {
            cross_domain_allowed,
            reverse_conventions,
        }
    }

    /// Whether a link between these two domains is historically valid
    pub fn cross_domain_allowed(&self, a: &str, b: &str) -> bool {
        self.cross_domain_allowed.contains(&domain_pair(a, b))
    }

    /// The reverse field a target is expected to link back under, if the
    /// field has a declared convention. Fields without one are exempt.
    pub fn reverse_field(&self, field: &str) -> Option<&str> {
        self.reverse_conventions.get(field).map(String::as_str)
    }
}

impl Default for LinkRules {
    fn default() -> Self {
        Self::from_config(&LinksConfig::default())
    }
}

fn domain_pair(a: &str, b: &str) -> (String, String) {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a <= b { (a, b) } else { (b, a) }
}

/// One reference together with its resolution outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub reference: Reference,
    pub resolution: Resolution,
}

/// Running counters over a validation pass
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinkCounters {
    pub total_links: usize,
    pub valid_links: usize,
    pub broken_links: usize,
    pub format_issues: usize,
    pub cross_domain_suspicious: usize,
    pub missing_bidirectional: usize,
}

impl LinkCounters {
    pub fn merge(&mut self, other: &LinkCounters) {
        self.total_links += other.total_links;
        self.valid_links += other.valid_links;
        self.broken_links += other.broken_links;
        self.format_issues += other.format_issues;
        self.cross_domain_suspicious += other.cross_domain_suspicious;
        self.missing_bidirectional += other.missing_bidirectional;
    }

    /// Share of extracted links that failed to resolve
    pub fn broken_ratio(&self) -> f64 {
        if self.total_links == 0 {
            0.0
        } else {
            self.broken_links as f64 / self.total_links as f64
        }
    }
}

/// Local validation result for one entity
#[derive(Debug, Default)]
pub struct EntityValidation {
    pub findings: Findings,
    pub counters: LinkCounters,
    pub links: Vec<ResolvedLink>,
}

/// Merged result of the whole validation phase
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub findings: Findings,
    pub counters: LinkCounters,
    pub links: Vec<ResolvedLink>,
    /// True when the run budget tripped before every entity was seen
    pub truncated: bool,
}

/// Validate all of one entity's references against the index
pub fn validate_entity(entity: &Entity, index: &EntityIndex, rules: &LinkRules) -> EntityValidation {
    let mut out = EntityValidation::default();

    for reference in extract(entity) {
        out.counters.total_links += 1;
        let resolution = resolve(&reference.raw, entity, index);

        match resolution.target.as_deref() {
            None => {
                out.counters.broken_links += 1;
                out.findings.push(Finding::new(
                    FindingCode::BrokenLink,
                    &entity.id,
                    &reference.field,
                    reference.raw.display(),
                    format!(
                        "reference '{}' does not resolve to any entity (tried {} strategies)",
                        reference.raw.display(),
                        resolution.attempted.len()
                    ),
                ));
            }
            Some(target_id) => {
                out.counters.valid_links += 1;

                if reference.raw.is_legacy_shape() {
                    out.counters.format_issues += 1;
                    out.findings.push(
                        Finding::new(
                            FindingCode::FormatIssue,
                            &entity.id,
                            &reference.field,
                            reference.raw.display(),
                            format!(
                                "legacy string reference '{}' should be an {{id, name}} object",
                                reference.raw.display()
                            ),
                        )
                        .with_resolved_target(target_id),
                    );
                }

                check_cross_domain(entity, &reference, target_id, index, rules, &mut out);
                check_bidirectional(entity, &reference, target_id, index, rules, &mut out);
            }
        }

        out.links.push(ResolvedLink {
            reference,
            resolution,
        });
    }

    out
}

fn check_cross_domain(
    entity: &Entity,
    reference: &Reference,
    target_id: &str,
    index: &EntityIndex,
    rules: &LinkRules,
    out: &mut EntityValidation,
) {
    let (Some(source_domain), Some(target_domain)) =
        (index.domain_of(&entity.id), index.domain_of(target_id))
    else {
        return;
    };
    if source_domain == target_domain || rules.cross_domain_allowed(source_domain, target_domain) {
        return;
    }

    out.counters.cross_domain_suspicious += 1;
    out.findings.push(
        Finding::new(
            FindingCode::CrossDomainSuspicious,
            &entity.id,
            &reference.field,
            reference.raw.display(),
            format!(
                "{} entity links a {} entity; pair is not on the historical whitelist",
                source_domain, target_domain
            ),
        )
        .with_resolved_target(target_id),
    );
}

fn check_bidirectional(
    entity: &Entity,
    reference: &Reference,
    target_id: &str,
    index: &EntityIndex,
    rules: &LinkRules,
    out: &mut EntityValidation,
) {
    let Some(reverse_field) = rules.reverse_field(&reference.field) else {
        return;
    };
    if target_id == entity.id {
        return;
    }
    let Some(target) = index.get(target_id) else {
        return;
    };

    let links_back = extract(target)
        .into_iter()
        .filter(|r| r.field == reverse_field)
        .any(|r| resolve(&r.raw, target, index).target.as_deref() == Some(entity.id.as_str()));

    if !links_back {
        out.counters.missing_bidirectional += 1;
        // Attributed to the side missing the entry
        out.findings.push(
            Finding::new(
                FindingCode::MissingBidirectional,
                target_id,
                reverse_field,
                &entity.id,
                format!(
                    "{} lists {} under '{}' but {} does not link back under '{}'",
                    entity.id, target_id, reference.field, target_id, reverse_field
                ),
            )
            .with_resolved_target(&entity.id),
        );
    }
}

/// Run the per-entity validation phase over the whole index.
///
/// Entities are processed on the rayon pool and merged in id order, so
/// the outcome is deterministic regardless of scheduling. The budget is
/// checked between entities; a tripped budget marks the outcome truncated.
pub fn validate_all(
    index: &EntityIndex,
    rules: &LinkRules,
    budget: &RunBudget,
    domain_filter: Option<&str>,
) -> ValidationOutcome {
    let mut entities: Vec<&Entity> = index
        .entities()
        .map(|e| e.as_ref())
        .filter(|e| match domain_filter {
            Some(domain) => index.domain_of(&e.id) == Some(domain),
            None => true,
        })
        .collect();
    entities.sort_by(|a, b| a.id.cmp(&b.id));

    let truncated = AtomicBool::new(false);

    let results: Vec<EntityValidation> = entities
        .par_iter()
        .map(|entity| {
            if budget.exhausted() {
                truncated.store(true, Ordering::Relaxed);
                return EntityValidation::default();
            }
            validate_entity(entity, index, rules)
        })
        .collect();

    let mut outcome = ValidationOutcome {
        truncated: truncated.load(Ordering::Relaxed),
        ..Default::default()
    };
    for result in results {
        outcome.findings.merge(result.findings);
        outcome.counters.merge(&result.counters);
        outcome.links.extend(result.links);
    }

    debug!(
        entities = entities.len(),
        links = outcome.counters.total_links,
        broken = outcome.counters.broken_links,
        "validation phase complete"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DEFAULT_KNOWN_DOMAINS;
    use crate::store::{EntityStore, RawEntityRecord};
    use serde_json::{json, Value};

    fn build(records: Vec<Value>) -> (EntityStore, EntityIndex) {
        let store = EntityStore::from_records(
            records
                .into_iter()
                .enumerate()
                .map(|(i, v)| RawEntityRecord::new(format!("r{}.json", i), v)),
        );
        let known: Vec<String> = DEFAULT_KNOWN_DOMAINS.iter().map(|s| s.to_string()).collect();
        let index = EntityIndex::build(&store, &known);
        (store, index)
    }

    #[test]
    fn test_broken_link_yields_exactly_one_finding() {
        let (_store, index) = build(vec![
            json!({"id": "greek_zeus", "name": "Zeus", "allies": ["nonexistent_entity_123"]}),
        ]);
        let entity = index.get("greek_zeus").unwrap().clone();
        let result = validate_entity(&entity, &index, &LinkRules::default());

        assert_eq!(result.counters.broken_links, 1);
        assert_eq!(result.findings.count_of(FindingCode::BrokenLink), 1);
    }

    #[test]
    fn test_whitelisted_cross_domain_is_clean() {
        let (_store, index) = build(vec![
            json!({"id": "greek_zeus", "name": "Zeus",
                   "relatedEntities": {"counterparts": [{"id": "roman_jupiter"}]}}),
            json!({"id": "roman_jupiter", "name": "Jupiter"}),
        ]);
        let entity = index.get("greek_zeus").unwrap().clone();
        let result = validate_entity(&entity, &index, &LinkRules::default());

        assert_eq!(result.counters.cross_domain_suspicious, 0);
        assert!(result.findings.is_empty());
    }

    #[test]
    fn test_unlisted_cross_domain_is_suspicious() {
        let (_store, index) = build(vec![
            json!({"id": "norse_odin", "name": "Odin",
                   "relatedEntities": {"counterparts": [{"id": "egyptian_ra"}]}}),
            json!({"id": "egyptian_ra", "name": "Ra"}),
        ]);
        let entity = index.get("norse_odin").unwrap().clone();
        let result = validate_entity(&entity, &index, &LinkRules::default());

        assert_eq!(result.counters.cross_domain_suspicious, 1);
        assert_eq!(result.findings.count_of(FindingCode::CrossDomainSuspicious), 1);
    }

    #[test]
    fn test_missing_bidirectional_attributed_to_missing_side() {
        let (_store, index) = build(vec![
            json!({"id": "greek_zeus", "name": "Zeus",
                   "relatedEntities": {"heroes": [{"id": "greek_perseus"}]}}),
            json!({"id": "greek_perseus", "name": "Perseus"}),
        ]);
        let entity = index.get("greek_zeus").unwrap().clone();
        let result = validate_entity(&entity, &index, &LinkRules::default());

        assert_eq!(result.counters.missing_bidirectional, 1);
        let finding = result
            .findings
            .of_code(FindingCode::MissingBidirectional)
            .next()
            .unwrap();
        assert_eq!(finding.source_id, "greek_perseus");
        assert_eq!(finding.field, "relatedEntities.deities");
        assert_eq!(finding.target, "greek_zeus");
    }

    #[test]
    fn test_symmetric_convention_satisfied() {
        let (_store, index) = build(vec![
            json!({"id": "greek_zeus", "name": "Zeus", "allies": ["greek_athena"]}),
            json!({"id": "greek_athena", "name": "Athena", "allies": ["greek_zeus"]}),
        ]);
        let entity = index.get("greek_zeus").unwrap().clone();
        let result = validate_entity(&entity, &index, &LinkRules::default());

        assert_eq!(result.counters.missing_bidirectional, 0);
        // bare string shape still reports a format issue
        assert_eq!(result.counters.format_issues, 1);
    }

    #[test]
    fn test_undeclared_field_exempt_from_bidirectional() {
        let (_store, index) = build(vec![
            json!({"id": "greek_zeus", "name": "Zeus",
                   "relatedEntities": {"mentioned": [{"id": "greek_perseus"}]}}),
            json!({"id": "greek_perseus", "name": "Perseus"}),
        ]);
        let entity = index.get("greek_zeus").unwrap().clone();
        let result = validate_entity(&entity, &index, &LinkRules::default());

        assert_eq!(result.counters.missing_bidirectional, 0);
    }

    #[test]
    fn test_validate_all_merges_deterministically() {
        let (_store, index) = build(vec![
            json!({"id": "greek_zeus", "name": "Zeus", "allies": ["nonexistent_a"]}),
            json!({"id": "greek_hera", "name": "Hera", "allies": ["nonexistent_b"]}),
        ]);
        let rules = LinkRules::default();

        let a = validate_all(&index, &rules, &RunBudget::unbounded(), None);
        let b = validate_all(&index, &rules, &RunBudget::unbounded(), None);

        assert_eq!(a.counters.total_links, 2);
        assert_eq!(a.counters.broken_links, b.counters.broken_links);
        let ids_a: Vec<_> = a.findings.all().iter().map(|f| f.source_id.clone()).collect();
        let ids_b: Vec<_> = b.findings.all().iter().map(|f| f.source_id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_domain_filter_restricts_sources() {
        let (_store, index) = build(vec![
            json!({"id": "greek_zeus", "name": "Zeus", "allies": ["nonexistent_a"]}),
            json!({"id": "norse_odin", "name": "Odin", "allies": ["nonexistent_b"]}),
        ]);
        let outcome = validate_all(
            &index,
            &LinkRules::default(),
            &RunBudget::unbounded(),
            Some("greek"),
        );
        assert_eq!(outcome.counters.total_links, 1);
        assert_eq!(outcome.findings.all()[0].source_id, "greek_zeus");
    }
}
