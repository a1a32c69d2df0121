//! Validation Findings
//!
//! Findings are the intended output of a successful run, not failures of
//! the tool. Each validation pass accumulates into its own local
//! collection; collections are merged afterwards, which is what makes the
//! per-entity phase safe to run in parallel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::EntityId;

/// Finding categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingCode {
    /// Reference could not be resolved to any entity
    BrokenLink,
    /// Reference resolved but was authored in a legacy string/path shape
    FormatIssue,
    /// Declared reverse field on the target does not link back
    MissingBidirectional,
    /// Cross-domain link outside the historical whitelist
    CrossDomainSuspicious,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrokenLink => "L001",
            Self::FormatIssue => "L002",
            Self::MissingBidirectional => "L003",
            Self::CrossDomainSuspicious => "L004",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::BrokenLink => Severity::Error,
            Self::MissingBidirectional | Self::CrossDomainSuspicious => Severity::Warning,
            Self::FormatIssue => Severity::Info,
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finding severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One reported issue from the validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub code: FindingCode,
    /// Entity the finding is attributed to. For bidirectional findings
    /// this is the side *missing* the entry.
    pub source_id: EntityId,
    /// Dotted field path where the problem sits (or is expected)
    pub field: String,
    /// The target reference as given
    pub target: String,
    /// Resolved target id when resolution succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_target: Option<EntityId>,
    pub message: String,
}

impl Finding {
    pub fn new(
        code: FindingCode,
        source_id: impl Into<EntityId>,
        field: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            source_id: source_id.into(),
            field: field.into(),
            target: target.into(),
            resolved_target: None,
            message: message.into(),
        }
    }

    pub fn with_resolved_target(mut self, target: impl Into<EntityId>) -> Self {
        self.resolved_target = Some(target.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({} / {})",
            self.code,
            self.severity(),
            self.message,
            self.source_id,
            self.field
        )
    }
}

/// Accumulated findings from a validation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.items.push(finding);
    }

    /// Merge another collection into this one (the parallel-phase fold)
    pub fn merge(&mut self, other: Findings) {
        self.items.extend(other.items);
    }

    pub fn all(&self) -> &[Finding] {
        &self.items
    }

    pub fn of_code(&self, code: FindingCode) -> impl Iterator<Item = &Finding> {
        self.items.iter().filter(move |f| f.code == code)
    }

    pub fn count_of(&self, code: FindingCode) -> usize {
        self.of_code(code).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Findings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Findings {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
