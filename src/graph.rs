//! Link Graph
//!
//! Directed graph over resolved references, built after the validation
//! phase. Backs orphan detection (the suggestion engine's candidate set)
//! and the per-domain coverage numbers in the report.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use crate::entity::EntityId;
use crate::index::EntityIndex;
use crate::validate::ResolvedLink;

/// Edge payload: the field the link was declared under plus resolution
/// confidence
#[derive(Debug, Clone)]
pub struct LinkEdge {
    pub field: String,
    pub confidence: f64,
}

/// The resolved-link graph
pub struct LinkGraph {
    graph: DiGraph<EntityId, LinkEdge>,
    node_of: HashMap<EntityId, NodeIndex>,
}

impl LinkGraph {
    /// Build from validation output. Every indexed entity gets a node,
    /// linked or not; only resolved references become edges.
    pub fn build(index: &EntityIndex, links: &[ResolvedLink]) -> Self {
        let mut ids: Vec<&EntityId> = index.entities().map(|e| &e.id).collect();
        ids.sort();

        let mut graph = DiGraph::with_capacity(ids.len(), links.len());
        let mut node_of = HashMap::with_capacity(ids.len());
        for id in ids {
            let idx = graph.add_node(id.clone());
            node_of.insert(id.clone(), idx);
        }

        for link in links {
            let Some(target) = &link.resolution.target else {
                continue;
            };
            let (Some(&from), Some(&to)) = (
                node_of.get(&link.reference.source_id),
                node_of.get(target),
            ) else {
                continue;
            };
            graph.add_edge(
                from,
                to,
                LinkEdge {
                    field: link.reference.field.clone(),
                    confidence: link.resolution.confidence,
                },
            );
        }

        Self { graph, node_of }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Immediate outgoing link targets
    pub fn refs_out(&self, id: &str) -> Vec<&EntityId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Immediate incoming link sources
    pub fn refs_in(&self, id: &str) -> Vec<&EntityId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&EntityId> {
        let Some(&idx) = self.node_of.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, direction)
            .filter_map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                self.graph.node_weight(other)
            })
            .collect()
    }

    /// In-degree and out-degree for one entity
    pub fn degree(&self, id: &str) -> (usize, usize) {
        let Some(&idx) = self.node_of.get(id) else {
            return (0, 0);
        };
        (
            self.graph.edges_directed(idx, Direction::Incoming).count(),
            self.graph.edges_directed(idx, Direction::Outgoing).count(),
        )
    }

    /// Entities with no resolved links in either direction, sorted by id
    pub fn orphans(&self) -> Vec<&EntityId> {
        let mut out: Vec<&EntityId> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph.edges_directed(idx, Direction::Incoming).next().is_none()
                    && self.graph.edges_directed(idx, Direction::Outgoing).next().is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect();
        out.sort();
        out
    }

    /// All edges as `(source, target, payload)`
    pub fn edges(&self) -> impl Iterator<Item = (&EntityId, &EntityId, &LinkEdge)> {
        self.graph.edge_references().filter_map(|e| {
            let source = self.graph.node_weight(e.source())?;
            let target = self.graph.node_weight(e.target())?;
            Some((source, target, e.weight()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{EntityIndex, DEFAULT_KNOWN_DOMAINS};
    use crate::pipeline::RunBudget;
    use crate::store::{EntityStore, RawEntityRecord};
    use crate::validate::{validate_all, LinkRules};
    use serde_json::json;

    fn fixture() -> (EntityIndex, Vec<ResolvedLink>) {
        let store = EntityStore::from_records(vec![
            RawEntityRecord::new(
                "a.json",
                json!({"id": "greek_zeus", "name": "Zeus",
                       "relatedEntities": {"heroes": [{"id": "greek_perseus"}]}}),
            ),
            RawEntityRecord::new("b.json", json!({"id": "greek_perseus", "name": "Perseus"})),
            RawEntityRecord::new("c.json", json!({"id": "roman_jupiter", "name": "Jupiter"})),
        ]);
        let known: Vec<String> = DEFAULT_KNOWN_DOMAINS.iter().map(|s| s.to_string()).collect();
        let index = EntityIndex::build(&store, &known);
        let outcome = validate_all(&index, &LinkRules::default(), &RunBudget::unbounded(), None);
        (index, outcome.links)
    }

    #[test]
    fn test_build_and_degrees() {
        let (index, links) = fixture();
        let graph = LinkGraph::build(&index, &links);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.refs_out("greek_zeus").len(), 1);
        assert_eq!(graph.refs_in("greek_perseus").len(), 1);
        assert_eq!(graph.degree("greek_perseus"), (1, 0));
    }

    #[test]
    fn test_orphans() {
        let (index, links) = fixture();
        let graph = LinkGraph::build(&index, &links);
        let orphans = graph.orphans();
        assert_eq!(orphans, vec!["roman_jupiter"]);
    }
}
