//! Entity Store Loading
//!
//! Loads entity records from an abstract source into an in-memory store.
//! The canonical adapter walks a directory tree of JSON files grouped by
//! category folder (`deities/`, `heroes/`, ...) with optional mythology
//! subfolders, but any `IntoIterator<Item = RawEntityRecord>` will do:
//! a Firestore export, a REST crawl, or an in-memory fixture.
//!
//! One bad record never aborts a pass: malformed records become
//! [`LoadIssue`] entries and loading continues.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::entity::{Entity, EntityId};
use crate::error::{Result, ValidatorError};

/// Configuration for directory loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip files whose relative path starts with one of these prefixes
    pub skip_prefixes: Vec<String>,
    /// Only load files whose relative path starts with one of these prefixes
    pub include_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "node_modules/".to_string(),
                ".git/".to_string(),
                "backups/".to_string(),
                "reports/".to_string(),
            ],
            include_prefixes: Vec::new(),
        }
    }
}

/// One raw record from an entity source, not yet parsed into an [`Entity`]
#[derive(Debug, Clone)]
pub struct RawEntityRecord {
    /// Source label (file path, document path, fixture name)
    pub origin: String,
    pub value: Value,
}

impl RawEntityRecord {
    pub fn new(origin: impl Into<String>, value: Value) -> Self {
        Self {
            origin: origin.into(),
            value,
        }
    }
}

/// Why a record was skipped or flagged during loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadIssueKind {
    /// Source bytes were not valid JSON
    MalformedRecord,
    /// Record parsed but carries no usable `id`
    MissingId,
    /// Same `id` seen from more than one origin; last write wins
    DuplicateId,
}

/// A per-record load problem. These are data, not errors: the pass
/// continues and the issues ride along into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadIssue {
    pub kind: LoadIssueKind,
    pub origin: String,
    pub message: String,
}

/// In-memory entity collection keyed by id
#[derive(Debug, Default)]
pub struct EntityStore {
    /// BTreeMap for deterministic iteration order across runs
    entities: BTreeMap<EntityId, Arc<Entity>>,
    issues: Vec<LoadIssue>,
    /// SHA256 over raw record bytes, for report provenance
    bundle_hash: String,
}

impl EntityStore {
    /// Build a store from an abstract record source.
    ///
    /// Duplicate ids are resolved last-write-wins, with a recorded
    /// [`LoadIssueKind::DuplicateId`] warning naming both origins. The
    /// source data is inconsistent here and intent cannot be inferred, so
    /// the observed behavior is kept as-is.
    pub fn from_records(records: impl IntoIterator<Item = RawEntityRecord>) -> Self {
        let mut entities: BTreeMap<EntityId, Arc<Entity>> = BTreeMap::new();
        let mut issues = Vec::new();
        let mut hasher = Sha256::new();

        for record in records {
            hasher.update(record.value.to_string().as_bytes());

            let origin = record.origin.clone();
            let Some(entity) = Entity::from_value(record.value, Some(origin.clone())) else {
                issues.push(LoadIssue {
                    kind: LoadIssueKind::MissingId,
                    origin: origin.clone(),
                    message: format!("record at {} has no usable id, skipped", origin),
                });
                continue;
            };

            if let Some(previous) = entities.get(&entity.id) {
                let previous_origin = previous.origin.as_deref().unwrap_or("<unknown>");
                warn!(
                    id = %entity.id,
                    previous = %previous_origin,
                    replacement = %origin,
                    "duplicate entity id, last write wins"
                );
                issues.push(LoadIssue {
                    kind: LoadIssueKind::DuplicateId,
                    origin: origin.clone(),
                    message: format!(
                        "duplicate id '{}': {} overwrites {}",
                        entity.id, origin, previous_origin
                    ),
                });
            }

            entities.insert(entity.id.clone(), Arc::new(entity));
        }

        Self {
            entities,
            issues,
            bundle_hash: format!("{:x}", hasher.finalize()),
        }
    }

    /// Load from a directory tree of JSON files.
    ///
    /// Fails only on pass-level structural problems: a missing root or a
    /// tree with no JSON records at all. Individual unreadable or
    /// malformed files become load issues.
    pub fn from_directory(root: &Path, config: &LoadConfig) -> Result<Self> {
        if !root.is_dir() {
            return Err(ValidatorError::SourceNotFound(root.to_path_buf()));
        }

        let mut records = Vec::new();
        let mut issues = Vec::new();

        // Sorted walk keeps the bundle hash stable across filesystems
        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path);
            let relative_str = relative.to_string_lossy();

            if !config.include_prefixes.is_empty()
                && !config
                    .include_prefixes
                    .iter()
                    .any(|p| relative_str.starts_with(p.as_str()))
            {
                continue;
            }
            if config
                .skip_prefixes
                .iter()
                .any(|p| relative_str.starts_with(p.as_str()))
            {
                continue;
            }

            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    issues.push(LoadIssue {
                        kind: LoadIssueKind::MalformedRecord,
                        origin: relative_str.to_string(),
                        message: format!("unreadable file: {}", e),
                    });
                    continue;
                }
            };

            match serde_json::from_str::<Value>(&content) {
                Ok(value) => records.push(RawEntityRecord::new(relative_str.to_string(), value)),
                Err(e) => {
                    issues.push(LoadIssue {
                        kind: LoadIssueKind::MalformedRecord,
                        origin: relative_str.to_string(),
                        message: format!("invalid JSON: {}", e),
                    });
                }
            }
        }

        if records.is_empty() {
            return Err(ValidatorError::NoRecords(root.display().to_string()));
        }

        debug!(
            records = records.len(),
            skipped = issues.len(),
            "loaded entity records from {}",
            root.display()
        );

        let mut store = Self::from_records(records);
        // File-level issues come before record-level ones
        issues.extend(store.issues.drain(..));
        store.issues = issues;
        Ok(store)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Entity>> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    pub fn issues(&self) -> &[LoadIssue] {
        &self.issues
    }

    pub fn bundle_hash(&self) -> &str {
        &self.bundle_hash
    }
}
