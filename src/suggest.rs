//! Suggestion Engine
//!
//! Proposes candidate links for entities by attribute overlap. Pairs are
//! only compared within a domain partition; partitions are small (tens to
//! low hundreds of entities), which keeps the O(n²) pair loop acceptable.
//! It must never run across the full unpartitioned set.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::EntityId;
use crate::index::EntityIndex;
use crate::pipeline::RunBudget;

/// A proposed link between two same-domain entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub domain: String,
    /// Jaccard overlap in 0..1
    pub overlap_score: f64,
    pub overlapping_terms: Vec<String>,
}

/// Jaccard overlap of two sorted, deduplicated term slices
pub fn jaccard(a: &[String], b: &[String]) -> (f64, Vec<String>) {
    if a.is_empty() && b.is_empty() {
        return (0.0, Vec::new());
    }

    let mut shared = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }

    let union = a.len() + b.len() - shared.len();
    let score = if union == 0 {
        0.0
    } else {
        shared.len() as f64 / union as f64
    };
    (score, shared)
}

/// Compute suggestions for every domain partition.
///
/// For each ordered pair of same-domain entities with differing type,
/// scores the overlap of their `domains ∪ symbols ∪ attributes` term sets
/// and emits a suggestion above the threshold. Returns the suggestions
/// sorted by score descending and whether the budget cut the pass short.
pub fn suggest_links(
    index: &EntityIndex,
    threshold: f64,
    budget: &RunBudget,
) -> (Vec<Suggestion>, bool) {
    let mut suggestions = Vec::new();
    let mut truncated = false;

    let mut domains: Vec<&String> = index.domains().collect();
    domains.sort();

    'domains: for domain in domains {
        let ids = index.ids_in_domain(domain);

        // Term sets are computed once per partition member
        let members: Vec<(&EntityId, Vec<String>)> = ids
            .iter()
            .filter_map(|id| index.get(id).map(|e| (id, e.similarity_terms())))
            .collect();

        for (source_id, source_terms) in &members {
            if budget.exhausted() {
                truncated = true;
                break 'domains;
            }
            let source_type = index.get(source_id.as_str()).and_then(|e| e.entity_type.clone());

            for (target_id, target_terms) in &members {
                if source_id == target_id {
                    continue;
                }
                // Same-type pairs are already faceted together; only
                // cross-type links are worth proposing
                let target_type = index.get(target_id.as_str()).and_then(|e| e.entity_type.clone());
                if source_type.is_some() && source_type == target_type {
                    continue;
                }

                let (score, shared) = jaccard(source_terms, target_terms);
                if score > threshold {
                    suggestions.push(Suggestion {
                        source_id: source_id.to_string(),
                        target_id: target_id.to_string(),
                        domain: domain.clone(),
                        overlap_score: score,
                        overlapping_terms: shared,
                    });
                }
            }
        }
    }

    suggestions.sort_by(|a, b| {
        b.overlap_score
            .partial_cmp(&a.overlap_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source_id.cmp(&b.source_id))
            .then_with(|| a.target_id.cmp(&b.target_id))
    });

    debug!(count = suggestions.len(), truncated, "suggestion pass complete");
    (suggestions, truncated)
}
