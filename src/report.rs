//! Report Generator
//!
//! Aggregates validator and suggestion output into plain structured data.
//! The report carries no behavior: it serializes to JSON as-is, and the
//! Markdown rendering is derived purely from the report object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::config::ReportConfig;
use crate::entity::EntityId;
use crate::graph::LinkGraph;
use crate::index::EntityIndex;
use crate::store::{EntityStore, LoadIssue};
use crate::suggest::Suggestion;
use crate::validate::{Finding, FindingCode, ValidationOutcome};

/// Top-level counts for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub entity_count: usize,
    pub domain_count: usize,
    pub total_links: usize,
    pub valid_links: usize,
    pub broken_links: usize,
    pub format_issues: usize,
    pub missing_bidirectional: usize,
    pub cross_domain_suspicious: usize,
    pub broken_ratio: f64,
    pub orphan_count: usize,
    pub suggestion_count: usize,
    pub load_issue_count: usize,
}

/// Link coverage for one domain partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainCoverage {
    pub asset_count: usize,
    pub total_links: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub internal_ratio: f64,
}

/// Link coverage for one entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetCoverage {
    pub outbound: usize,
    pub inbound: usize,
    pub broken: usize,
}

/// Structured validation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    /// SHA256 over the raw source records
    pub bundle_hash: String,
    /// True when a deadline or cancellation cut the pass short
    pub truncated: bool,
    pub summary: ReportSummary,
    pub broken_links: Vec<Finding>,
    pub format_issues: Vec<Finding>,
    pub bidirectional_issues: Vec<Finding>,
    pub cross_domain: Vec<Finding>,
    pub suggestions: Vec<Suggestion>,
    /// BTreeMaps keep serialization deterministic across runs
    pub asset_coverage: BTreeMap<EntityId, AssetCoverage>,
    pub domain_coverage: BTreeMap<String, DomainCoverage>,
    pub load_issues: Vec<LoadIssue>,
}

/// Assemble the report from the pipeline's pieces
pub fn build_report(
    store: &EntityStore,
    index: &EntityIndex,
    outcome: &ValidationOutcome,
    graph: &LinkGraph,
    suggestions: Vec<Suggestion>,
    truncated: bool,
    config: &ReportConfig,
) -> ValidationReport {
    let cap = config.max_findings;
    let collect_code = |code: FindingCode| -> Vec<Finding> {
        outcome.findings.of_code(code).take(cap).cloned().collect()
    };

    let domain_coverage = domain_coverage(index, outcome);
    let asset_coverage = asset_coverage(index, outcome, graph);

    let summary = ReportSummary {
        entity_count: index.entity_count(),
        domain_count: domain_coverage.len(),
        total_links: outcome.counters.total_links,
        valid_links: outcome.counters.valid_links,
        broken_links: outcome.counters.broken_links,
        format_issues: outcome.counters.format_issues,
        missing_bidirectional: outcome.counters.missing_bidirectional,
        cross_domain_suspicious: outcome.counters.cross_domain_suspicious,
        broken_ratio: outcome.counters.broken_ratio(),
        orphan_count: graph.orphans().len(),
        suggestion_count: suggestions.len(),
        load_issue_count: store.issues().len(),
    };

    ValidationReport {
        generated_at: Utc::now(),
        bundle_hash: store.bundle_hash().to_string(),
        truncated,
        summary,
        broken_links: collect_code(FindingCode::BrokenLink),
        format_issues: collect_code(FindingCode::FormatIssue),
        bidirectional_issues: collect_code(FindingCode::MissingBidirectional),
        cross_domain: collect_code(FindingCode::CrossDomainSuspicious),
        suggestions,
        asset_coverage,
        domain_coverage,
        load_issues: store.issues().to_vec(),
    }
}

fn domain_coverage(
    index: &EntityIndex,
    outcome: &ValidationOutcome,
) -> BTreeMap<String, DomainCoverage> {
    let mut coverage: BTreeMap<String, DomainCoverage> = index
        .domains()
        .map(|d| {
            (
                d.clone(),
                DomainCoverage {
                    asset_count: index.ids_in_domain(d).len(),
                    total_links: 0,
                    internal_links: 0,
                    external_links: 0,
                    internal_ratio: 0.0,
                },
            )
        })
        .collect();

    for link in &outcome.links {
        let Some(source_domain) = index.domain_of(&link.reference.source_id) else {
            continue;
        };
        let Some(entry) = coverage.get_mut(source_domain) else {
            continue;
        };
        entry.total_links += 1;

        if let Some(target) = &link.resolution.target {
            match index.domain_of(target) {
                Some(d) if d == source_domain => entry.internal_links += 1,
                Some(_) => entry.external_links += 1,
                None => {}
            }
        }
    }

    for entry in coverage.values_mut() {
        if entry.total_links > 0 {
            entry.internal_ratio = entry.internal_links as f64 / entry.total_links as f64;
        }
    }

    coverage
}

fn asset_coverage(
    index: &EntityIndex,
    outcome: &ValidationOutcome,
    graph: &LinkGraph,
) -> BTreeMap<EntityId, AssetCoverage> {
    let mut coverage: BTreeMap<EntityId, AssetCoverage> = index
        .entities()
        .map(|e| {
            let (inbound, outbound) = graph.degree(&e.id);
            (
                e.id.clone(),
                AssetCoverage {
                    outbound,
                    inbound,
                    broken: 0,
                },
            )
        })
        .collect();

    for link in &outcome.links {
        if link.resolution.target.is_none() {
            if let Some(entry) = coverage.get_mut(&link.reference.source_id) {
                entry.broken += 1;
            }
        }
    }

    coverage
}

impl ValidationReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable rendering, derived purely from the report data
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        let _ = writeln!(out, "# Link Validation Report");
        let _ = writeln!(out);
        let _ = writeln!(out, "Generated: {}", self.generated_at.to_rfc3339());
        let _ = writeln!(out, "Bundle: `{}`", self.bundle_hash);
        if self.truncated {
            let _ = writeln!(out);
            let _ = writeln!(out, "**Warning: run was cut short by deadline/cancellation.**");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "## Summary");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Metric | Value |");
        let _ = writeln!(out, "|--------|-------|");
        let _ = writeln!(out, "| Entities | {} |", s.entity_count);
        let _ = writeln!(out, "| Domains | {} |", s.domain_count);
        let _ = writeln!(out, "| Total links | {} |", s.total_links);
        let _ = writeln!(out, "| Valid links | {} |", s.valid_links);
        let _ = writeln!(out, "| Broken links | {} ({:.1}%) |", s.broken_links, s.broken_ratio * 100.0);
        let _ = writeln!(out, "| Format issues | {} |", s.format_issues);
        let _ = writeln!(out, "| Missing bidirectional | {} |", s.missing_bidirectional);
        let _ = writeln!(out, "| Cross-domain suspicious | {} |", s.cross_domain_suspicious);
        let _ = writeln!(out, "| Orphaned entities | {} |", s.orphan_count);
        let _ = writeln!(out, "| Suggestions | {} |", s.suggestion_count);
        let _ = writeln!(out, "| Load issues | {} |", s.load_issue_count);
        let _ = writeln!(out);

        let _ = writeln!(out, "## Domain Coverage");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Domain | Assets | Links | Internal | External | Internal % |");
        let _ = writeln!(out, "|--------|--------|-------|----------|----------|------------|");
        for (domain, c) in &self.domain_coverage {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {:.1}% |",
                domain,
                c.asset_count,
                c.total_links,
                c.internal_links,
                c.external_links,
                c.internal_ratio * 100.0
            );
        }
        let _ = writeln!(out);

        render_findings(&mut out, "Broken Links", &self.broken_links);
        render_findings(&mut out, "Format Issues", &self.format_issues);
        render_findings(&mut out, "Missing Bidirectional", &self.bidirectional_issues);
        render_findings(&mut out, "Suspicious Cross-Domain", &self.cross_domain);

        if !self.suggestions.is_empty() {
            let _ = writeln!(out, "## Suggested Links");
            let _ = writeln!(out);
            let _ = writeln!(out, "| Source | Target | Domain | Score | Shared terms |");
            let _ = writeln!(out, "|--------|--------|--------|-------|--------------|");
            for sug in &self.suggestions {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {:.2} | {} |",
                    sug.source_id,
                    sug.target_id,
                    sug.domain,
                    sug.overlap_score,
                    sug.overlapping_terms.join(", ")
                );
            }
            let _ = writeln!(out);
        }

        if !self.load_issues.is_empty() {
            let _ = writeln!(out, "## Load Issues");
            let _ = writeln!(out);
            for issue in &self.load_issues {
                let _ = writeln!(out, "- `{}`: {}", issue.origin, issue.message);
            }
            let _ = writeln!(out);
        }

        out
    }
}

fn render_findings(out: &mut String, title: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {}", title);
    let _ = writeln!(out);
    for finding in findings {
        let _ = writeln!(
            out,
            "- **{}** `{}` ({}): {}",
            finding.source_id, finding.field, finding.target, finding.message
        );
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::index::{EntityIndex, DEFAULT_KNOWN_DOMAINS};
    use crate::pipeline::RunBudget;
    use crate::store::{EntityStore, RawEntityRecord};
    use crate::validate::{validate_all, LinkRules};
    use serde_json::json;

    fn report() -> ValidationReport {
        let store = EntityStore::from_records(vec![
            RawEntityRecord::new(
                "a.json",
                json!({"id": "greek_zeus", "name": "Zeus",
                       "allies": ["nonexistent_entity_123", "greek_hera"]}),
            ),
            RawEntityRecord::new("b.json", json!({"id": "greek_hera", "name": "Hera",
                                                   "allies": ["greek_zeus"]})),
        ]);
        let known: Vec<String> = DEFAULT_KNOWN_DOMAINS.iter().map(|s| s.to_string()).collect();
        let index = EntityIndex::build(&store, &known);
        let outcome = validate_all(&index, &LinkRules::default(), &RunBudget::unbounded(), None);
        let graph = LinkGraph::build(&index, &outcome.links);
        build_report(
            &store,
            &index,
            &outcome,
            &graph,
            Vec::new(),
            false,
            &ValidatorConfig::default().report,
        )
    }

    #[test]
    fn test_summary_counts() {
        let report = report();
        assert_eq!(report.summary.entity_count, 2);
        assert_eq!(report.summary.total_links, 3);
        assert_eq!(report.summary.broken_links, 1);
        assert_eq!(report.summary.valid_links, 2);
        assert!((report.summary.broken_ratio - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_domain_coverage_table() {
        let report = report();
        let greek = report.domain_coverage.get("greek").unwrap();
        assert_eq!(greek.asset_count, 2);
        assert_eq!(greek.total_links, 3);
        assert_eq!(greek.internal_links, 2);
        assert_eq!(greek.external_links, 0);
    }

    #[test]
    fn test_json_round_trip() {
        let report = report();
        let json = report.to_json().unwrap();
        let back: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.total_links, report.summary.total_links);
    }

    #[test]
    fn test_markdown_contains_sections() {
        let md = report().to_markdown();
        assert!(md.contains("# Link Validation Report"));
        assert!(md.contains("## Domain Coverage"));
        assert!(md.contains("## Broken Links"));
        assert!(md.contains("nonexistent_entity_123"));
    }
}
