//! Configuration management for the link validator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (mythlink.toml)
//! - Environment variables (MYTHLINK_*)
//!
//! ## Example config file (mythlink.toml):
//! ```toml
//! [source]
//! skip_prefixes = ["backups/", "reports/"]
//!
//! [domains]
//! known = ["greek", "roman", "norse"]
//!
//! [links]
//! cross_domain_allowed = [["greek", "roman"], ["aztec", "mayan"]]
//!
//! [suggestions]
//! threshold = 0.3
//! max = 50
//!
//! [report]
//! fail_threshold = 0.2
//! max_findings = 500
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::index::DEFAULT_KNOWN_DOMAINS;
use crate::store::LoadConfig;

/// Main configuration for a validation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Source loading settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Domain vocabulary settings
    #[serde(default)]
    pub domains: DomainConfig,

    /// Link validation rules
    #[serde(default)]
    pub links: LinksConfig,

    /// Suggestion engine settings
    #[serde(default)]
    pub suggestions: SuggestionConfig,

    /// Report shaping settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Source loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Skip files whose relative path starts with one of these prefixes
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// Only load files under these prefixes (empty = everything)
    #[serde(default)]
    pub include_prefixes: Vec<String>,
}

/// Domain vocabulary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Known domains for id-prefix inference
    #[serde(default = "default_known_domains")]
    pub known: Vec<String>,
}

/// Link validation rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// Historically valid cross-domain pairs; links between these produce
    /// no finding. Grown organically in the source data, kept verbatim.
    #[serde(default = "default_cross_domain_allowed")]
    pub cross_domain_allowed: Vec<(String, String)>,

    /// Field pairs expected to be mutually consistent. A field with no
    /// entry here is exempt from the bidirectional check.
    #[serde(default = "default_reverse_conventions")]
    pub reverse_conventions: Vec<(String, String)>,
}

/// Suggestion engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// Minimum Jaccard overlap for a suggestion to be emitted
    #[serde(default = "default_suggestion_threshold")]
    pub threshold: f64,

    /// Cap on suggestions carried into the report
    #[serde(default = "default_max_suggestions")]
    pub max: usize,
}

/// Report shaping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Broken-link ratio above which the CLI exits non-zero
    #[serde(default = "default_fail_threshold")]
    pub fail_threshold: f64,

    /// Cap on findings carried per category (readability)
    #[serde(default = "default_max_findings")]
    pub max_findings: usize,
}

// Default value functions

fn default_skip_prefixes() -> Vec<String> {
    LoadConfig::default().skip_prefixes
}

fn default_known_domains() -> Vec<String> {
    DEFAULT_KNOWN_DOMAINS.iter().map(|s| s.to_string()).collect()
}

fn default_cross_domain_allowed() -> Vec<(String, String)> {
    [
        ("greek", "roman"),
        ("sumerian", "babylonian"),
        ("hindu", "buddhist"),
        ("christian", "jewish"),
        ("aztec", "mayan"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

fn default_reverse_conventions() -> Vec<(String, String)> {
    [
        ("relatedEntities.deities", "relatedEntities.heroes"),
        ("family.parents", "family.children"),
        ("allies", "allies"),
        ("enemies", "enemies"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

fn default_suggestion_threshold() -> f64 {
    0.3
}

fn default_max_suggestions() -> usize {
    50
}

fn default_fail_threshold() -> f64 {
    0.2
}

fn default_max_findings() -> usize {
    500
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: default_skip_prefixes(),
            include_prefixes: Vec::new(),
        }
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            known: default_known_domains(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            cross_domain_allowed: default_cross_domain_allowed(),
            reverse_conventions: default_reverse_conventions(),
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            threshold: default_suggestion_threshold(),
            max: default_max_suggestions(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fail_threshold: default_fail_threshold(),
            max_findings: default_max_findings(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["mythlink.toml", ".mythlink.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("MYTHLINK")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Loader settings in the form the store expects
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            skip_prefixes: self.source.skip_prefixes.clone(),
            include_prefixes: self.source.include_prefixes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidatorConfig::default();
        assert_eq!(config.suggestions.threshold, 0.3);
        assert_eq!(config.report.fail_threshold, 0.2);
        assert_eq!(config.links.cross_domain_allowed.len(), 5);
        assert!(config.domains.known.contains(&"greek".to_string()));
    }

    #[test]
    fn test_serialize_config() {
        let config = ValidatorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[domains]"));
        assert!(toml_str.contains("[suggestions]"));
    }
}
