use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One registered domain pattern, as persisted in `user_domains.json`.
///
/// Fields are declared in alphabetical order so the persisted document keeps
/// sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEntry {
    pub domain_pattern: String,
    #[serde(default)]
    pub identifiers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub organisation_id: Option<String>,
    #[serde(default)]
    pub organisation_type_id: String,
    #[serde(default)]
    pub source: String,
}

impl DomainEntry {
    pub fn is_wildcard(&self) -> bool {
        self.domain_pattern.starts_with("*.")
    }

    /// The part a matching domain must end with, e.g. `.example.gov.uk` for
    /// `*.example.gov.uk`.
    pub fn wildcard_suffix(&self) -> Option<&str> {
        self.domain_pattern
            .strip_prefix('*')
            .filter(|suffix| suffix.starts_with('.'))
    }
}

/// The persisted registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    pub version: String,
    #[serde(default)]
    pub domains: Vec<DomainEntry>,
}

/// Organisation metadata keyed by organisation id. Records are opaque.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganisationDirectory {
    records: HashMap<String, serde_json::Value>,
}

impl OrganisationDirectory {
    pub fn new(records: HashMap<String, serde_json::Value>) -> Self {
        Self { records }
    }

    pub fn get(&self, organisation_id: &str) -> Option<&serde_json::Value> {
        self.records.get(organisation_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Local,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Remote => write!(f, "remote"),
            DataSource::Local => write!(f, "local"),
        }
    }
}

/// How to choose between several matching wildcard patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildcardStrategy {
    /// The last matching wildcard in registry order wins.
    #[default]
    LastMatch,
    /// The wildcard with the longest suffix wins; ties go to the later entry.
    MostSpecific,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupOptions {
    pub enrich: bool,
    pub strategy: WildcardStrategy,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            enrich: true,
            strategy: WildcardStrategy::LastMatch,
        }
    }
}

impl LookupOptions {
    pub fn without_enrichment(strategy: WildcardStrategy) -> Self {
        Self {
            enrich: false,
            strategy,
        }
    }
}

/// A resolved entry plus its organisation record, if one was requested and found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainMatch {
    #[serde(flatten)]
    pub entry: DomainEntry,
    #[serde(rename = "govuk_data", skip_serializing_if = "Option::is_none")]
    pub organisation: Option<serde_json::Value>,
}
