use crate::core::lookup;
use crate::domain::model::{DataSource, DomainEntry, OrganisationDirectory, RegistryDocument};
use crate::utils::error::{Result, UkpsError};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// An immutable view of the registry as of one successful load.
///
/// Built once from the two documents and never mutated afterwards; a refresh
/// publishes a new `Snapshot` instead.
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: String,
    source: DataSource,
    entries: Vec<DomainEntry>,
    exact: HashMap<String, usize>,
    wildcards: Vec<usize>,
    organisations: OrganisationDirectory,
}

impl Snapshot {
    pub fn new(
        document: RegistryDocument,
        organisations: OrganisationDirectory,
        source: DataSource,
    ) -> Self {
        let mut entries = Vec::with_capacity(document.domains.len());
        let mut exact = HashMap::new();
        let mut wildcards = Vec::new();

        for mut entry in document.domains {
            let pattern = lookup::normalize_pattern(&entry.domain_pattern);
            if pattern.is_empty() {
                tracing::warn!("Skipping registry entry with empty domain_pattern");
                continue;
            }
            entry.domain_pattern = pattern;

            let index = entries.len();
            if entry.is_wildcard() {
                wildcards.push(index);
            }
            // wildcard patterns are indexed too: `*.x.gov.uk` looked up literally is an exact hit
            match exact.entry(entry.domain_pattern.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(_) => {
                    tracing::warn!(
                        "Duplicate domain_pattern {} in registry, keeping the first",
                        entry.domain_pattern
                    );
                }
            }
            entries.push(entry);
        }

        tracing::debug!(
            "Built snapshot v{} from {}: {} entries ({} wildcard), {} organisations",
            document.version,
            source,
            entries.len(),
            wildcards.len(),
            organisations.len()
        );

        Self {
            version: document.version,
            source,
            entries,
            exact,
            wildcards,
            organisations,
        }
    }

    /// Parses both documents; either failing to parse fails the whole snapshot.
    pub fn from_json(
        registry_name: &str,
        registry: &[u8],
        organisations_name: &str,
        organisations: &[u8],
        source: DataSource,
    ) -> Result<Self> {
        let document: RegistryDocument =
            serde_json::from_slice(registry).map_err(|e| UkpsError::InvalidDocument {
                document: registry_name.to_string(),
                reason: e.to_string(),
            })?;

        let value: serde_json::Value =
            serde_json::from_slice(organisations).map_err(|e| UkpsError::InvalidDocument {
                document: organisations_name.to_string(),
                reason: e.to_string(),
            })?;
        let directory = organisation_directory_from_value(organisations_name, value)?;

        Ok(Self::new(document, directory, source))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    /// Entries in registry order, with normalized patterns.
    pub fn entries(&self) -> &[DomainEntry] {
        &self.entries
    }

    pub fn organisations(&self) -> &OrganisationDirectory {
        &self.organisations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn exact_match(&self, domain: &str) -> Option<&DomainEntry> {
        self.exact.get(domain).map(|&index| &self.entries[index])
    }

    /// Wildcard entries in registry order.
    pub(crate) fn wildcard_entries(&self) -> impl Iterator<Item = &DomainEntry> {
        self.wildcards.iter().map(move |&index| &self.entries[index])
    }
}

/// Accepts either an object keyed by organisation id, or an array of records
/// as published by the GOV.UK organisations API. Array records are keyed by
/// their `id` and, when present, their `details.slug`.
pub fn organisation_directory_from_value(
    document: &str,
    value: serde_json::Value,
) -> Result<OrganisationDirectory> {
    match value {
        serde_json::Value::Object(map) => Ok(OrganisationDirectory::new(map.into_iter().collect())),
        serde_json::Value::Array(items) => {
            let mut records = HashMap::new();
            for item in items {
                let keys: Vec<String> = [
                    item.get("id").and_then(|v| v.as_str()),
                    item.pointer("/details/slug").and_then(|v| v.as_str()),
                ]
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();

                if keys.is_empty() {
                    tracing::debug!("Skipping organisation record without id or slug");
                    continue;
                }
                for key in keys {
                    records.entry(key).or_insert_with(|| item.clone());
                }
            }
            Ok(OrganisationDirectory::new(records))
        }
        other => Err(UkpsError::InvalidDocument {
            document: document.to_string(),
            reason: format!("expected an object or array, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
