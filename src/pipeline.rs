//! Validation Pipeline
//!
//! load → index → validate-all → graph → suggest → report.
//!
//! The index is built atomically from a fully loaded store before any
//! validation begins; no step observes a partially built index. The run
//! budget is checked between entities and between suggestion pairs, so a
//! caller can bound long runs without partial-state cleanup: all mutation
//! is append-only into local accumulators.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::ValidatorConfig;
use crate::error::{Result, ValidatorError};
use crate::graph::LinkGraph;
use crate::index::EntityIndex;
use crate::report::{build_report, ValidationReport};
use crate::store::{EntityStore, RawEntityRecord};
use crate::suggest::suggest_links;
use crate::validate::{validate_all, LinkRules};

/// Deadline and cancellation signal for one pass.
///
/// Checked between entities, never mid-entity, so tripping it leaves no
/// partial state behind.
#[derive(Debug, Clone, Default)]
pub struct RunBudget {
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl RunBudget {
    /// No deadline, no cancellation
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bound the whole pass by a wall-clock duration
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Attach a shared cancellation flag (set it from another thread)
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn exhausted(&self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return true;
            }
        }
        false
    }
}

/// Run the full pipeline over an abstract record source
pub fn run_records(
    records: impl IntoIterator<Item = RawEntityRecord>,
    config: &ValidatorConfig,
    domain_filter: Option<&str>,
    budget: &RunBudget,
) -> Result<ValidationReport> {
    let store = EntityStore::from_records(records);
    if store.is_empty() {
        return Err(ValidatorError::NoRecords("<records>".to_string()));
    }
    run_store(&store, config, domain_filter, budget)
}

/// Run the full pipeline over a directory tree of JSON files
pub fn run_directory(
    root: &Path,
    config: &ValidatorConfig,
    domain_filter: Option<&str>,
    budget: &RunBudget,
) -> Result<ValidationReport> {
    let store = EntityStore::from_directory(root, &config.load_config())?;
    run_store(&store, config, domain_filter, budget)
}

/// Validate an already loaded store
pub fn run_store(
    store: &EntityStore,
    config: &ValidatorConfig,
    domain_filter: Option<&str>,
    budget: &RunBudget,
) -> Result<ValidationReport> {
    info!(entities = store.len(), issues = store.issues().len(), "store loaded");

    let index = EntityIndex::build(store, &config.domains.known);
    let rules = LinkRules::from_config(&config.links);

    let outcome = validate_all(&index, &rules, budget, domain_filter);
    info!(
        links = outcome.counters.total_links,
        broken = outcome.counters.broken_links,
        findings = outcome.findings.len(),
        "validation complete"
    );

    let graph = LinkGraph::build(&index, &outcome.links);

    let (mut suggestions, suggest_truncated) = if budget.exhausted() {
        (Vec::new(), true)
    } else {
        suggest_links(&index, config.suggestions.threshold, budget)
    };
    if let Some(domain) = domain_filter {
        suggestions.retain(|s| s.domain == domain);
    }
    suggestions.truncate(config.suggestions.max);

    let truncated = outcome.truncated || suggest_truncated;
    Ok(build_report(
        store,
        &index,
        &outcome,
        &graph,
        suggestions,
        truncated,
        &config.report,
    ))
}
