//! Mythlink — cross-entity link validator
//!
//! Loads mythology encyclopedia entity records (deities, heroes,
//! creatures, herbs, ...), builds in-memory indices, and validates the
//! cross-entity reference graph: broken links, legacy reference shapes,
//! bidirectional completeness, and suspicious cross-domain links. Weakly
//! linked entities get candidate-link suggestions scored by attribute
//! overlap.
//!
//! ## Pipeline
//!
//! ```text
//! source (dir tree / records)
//!   └─> EntityStore          load, duplicate handling, bundle hash
//!         └─> EntityIndex    by-id / by-type / by-domain / by-name
//!               ├─> extract + resolve + validate   (parallel, per entity)
//!               ├─> LinkGraph                      orphans, coverage
//!               ├─> suggest_links                  per-domain Jaccard
//!               └─> ValidationReport               JSON / Markdown
//! ```
//!
//! Findings are the product of a successful run, not errors; only
//! pass-level structural problems (missing source root, zero records)
//! surface as [`ValidatorError`].

pub mod config;
pub mod entity;
pub mod error;
pub mod graph;
pub mod index;
pub mod pipeline;
pub mod refs;
pub mod report;
pub mod store;
pub mod suggest;
pub mod validate;

pub use config::ValidatorConfig;
pub use entity::{Entity, EntityId};
pub use error::{Result, ValidatorError};
pub use graph::LinkGraph;
pub use index::EntityIndex;
pub use pipeline::{run_directory, run_records, run_store, RunBudget};
pub use report::ValidationReport;
pub use store::{EntityStore, LoadIssue, RawEntityRecord};
pub use suggest::Suggestion;
pub use validate::{Finding, FindingCode, Findings, LinkRules};
