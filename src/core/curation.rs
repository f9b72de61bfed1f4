use crate::core::lookup::normalize_pattern;
use crate::domain::model::{DomainEntry, RegistryDocument};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, UkpsError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A domain found by a collector, before it becomes a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedDomain {
    pub domain: String,
    pub notes: String,
    pub organisation_type_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub updated: usize,
}

impl MergeSummary {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0
    }
}

/// `major.minor.patch` to `major.(minor+1).0`.
pub fn bump_minor_version(version: &str) -> Result<String> {
    let invalid = || UkpsError::InvalidVersion {
        version: version.to_string(),
    };

    let parts: Vec<&str> = version.trim().split('.').collect();
    let [major, minor, patch] = parts.as_slice() else {
        return Err(invalid());
    };

    let major: u64 = major.parse().map_err(|_| invalid())?;
    let minor: u64 = minor.parse().map_err(|_| invalid())?;
    patch.parse::<u64>().map_err(|_| invalid())?;

    let minor = minor.checked_add(1).ok_or_else(invalid)?;

    Ok(format!("{}.{}.0", major, minor))
}

/// The registry file as found on disk, unknown keys included.
#[derive(Debug, Serialize, Deserialize)]
struct RawDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<Value>,
    #[serde(default)]
    domains: Vec<Map<String, Value>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

fn raw_pattern(entry: &Map<String, Value>) -> &str {
    entry
        .get("domain_pattern")
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| UkpsError::InvalidDocument {
        document: "registry".to_string(),
        reason: e.to_string(),
    })
}

impl RegistryDocument {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn sort_domains(&mut self) {
        self.domains
            .sort_by(|a, b| a.domain_pattern.cmp(&b.domain_pattern));
    }

    /// Four-space indented JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    /// Sorts and renders the document; `Some` only when the text changed.
    ///
    /// Works on the raw JSON, so keys outside the documented entry fields
    /// survive. `version` stays first and entry keys come out alphabetically.
    pub fn reformat(original_text: &str) -> Result<Option<String>> {
        let mut document: RawDocument = serde_json::from_str(original_text)?;
        document.domains.sort_by(|a, b| raw_pattern(a).cmp(raw_pattern(b)));
        let formatted = to_pretty_json(&document)?;
        Ok((formatted != original_text).then_some(formatted))
    }

    /// Normalized patterns that occur more than once.
    pub fn duplicate_patterns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for entry in &self.domains {
            let pattern = normalize_pattern(&entry.domain_pattern);
            if !seen.insert(pattern.clone()) {
                duplicates.insert(pattern);
            }
        }
        duplicates.into_iter().collect()
    }

    /// Adds new domains and refreshes the notes of entries `source` owns.
    ///
    /// Entries owned by another source are never modified.
    pub fn merge_collected(&mut self, source: &str, collected: &[CollectedDomain]) -> MergeSummary {
        let mut existing: HashMap<String, usize> = self
            .domains
            .iter()
            .enumerate()
            .map(|(index, entry)| (normalize_pattern(&entry.domain_pattern), index))
            .collect();
        let mut summary = MergeSummary::default();

        for item in collected {
            let domain = normalize_pattern(&item.domain);
            if domain.is_empty() {
                continue;
            }

            if let Some(&index) = existing.get(&domain) {
                let entry = &mut self.domains[index];
                if entry.source == source && entry.notes != item.notes {
                    tracing::info!(
                        "Updated {}: '{}' -> '{}'",
                        domain,
                        entry.notes,
                        item.notes
                    );
                    entry.notes = item.notes.clone();
                    summary.updated += 1;
                }
                continue;
            }

            tracing::info!("Added {}", domain);
            self.domains.push(DomainEntry {
                domain_pattern: domain.clone(),
                identifiers: BTreeMap::new(),
                notes: item.notes.clone(),
                organisation_id: None,
                organisation_type_id: item.organisation_type_id.clone(),
                source: source.to_string(),
            });
            existing.insert(domain, self.domains.len() - 1);
            summary.added += 1;
        }

        self.sort_domains();
        summary
    }

    /// Entries owned by `source` that the latest collection no longer contains.
    pub fn find_stale(&self, source: &str, collected_domains: &HashSet<String>) -> Vec<&DomainEntry> {
        let collected = normalized_set(collected_domains);
        self.domains
            .iter()
            .filter(|entry| is_stale(entry, source, &collected))
            .collect()
    }

    pub fn remove_stale(&mut self, source: &str, collected_domains: &HashSet<String>) -> usize {
        let collected = normalized_set(collected_domains);
        let before = self.domains.len();
        self.domains.retain(|entry| {
            let stale = is_stale(entry, source, &collected);
            if stale {
                tracing::info!("Removed {}", entry.domain_pattern);
            }
            !stale
        });
        before - self.domains.len()
    }

    pub fn bump_minor_version(&mut self) -> Result<()> {
        let bumped = bump_minor_version(&self.version)?;
        tracing::info!("Version: {} -> {}", self.version, bumped);
        self.version = bumped;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOutcome {
    Unchanged,
    /// Check mode only: the file would be rewritten.
    NeedsFormatting,
    Formatted,
}

/// Reformats `file` in place through `storage`, or only reports in check mode.
pub async fn format_registry_file<S: Storage>(
    storage: &S,
    file: &str,
    check: bool,
) -> Result<FormatOutcome> {
    let data = storage.read_file(file).await?;
    let original = String::from_utf8(data).map_err(|e| UkpsError::InvalidDocument {
        document: file.to_string(),
        reason: e.to_string(),
    })?;

    let document = RegistryDocument::from_json(original.as_bytes())?;
    for pattern in document.duplicate_patterns() {
        tracing::warn!("⚠️ Duplicate domain_pattern in {}: {}", file, pattern);
    }

    match RegistryDocument::reformat(&original)? {
        None => Ok(FormatOutcome::Unchanged),
        Some(_) if check => Ok(FormatOutcome::NeedsFormatting),
        Some(formatted) => {
            storage.write_file(file, formatted.as_bytes()).await?;
            tracing::info!("Formatted {}", file);
            Ok(FormatOutcome::Formatted)
        }
    }
}

fn normalized_set(domains: &HashSet<String>) -> HashSet<String> {
    domains.iter().map(|domain| normalize_pattern(domain)).collect()
}

fn is_stale(entry: &DomainEntry, source: &str, collected: &HashSet<String>) -> bool {
    entry.source == source && !collected.contains(&normalize_pattern(&entry.domain_pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalStorage;
    use tempfile::TempDir;

    const SOURCE: &str = "localgov.co.uk";

    fn entry(pattern: &str, notes: &str, source: &str) -> DomainEntry {
        DomainEntry {
            domain_pattern: pattern.to_string(),
            identifiers: BTreeMap::new(),
            notes: notes.to_string(),
            organisation_id: None,
            organisation_type_id: "local_authority".to_string(),
            source: source.to_string(),
        }
    }

    fn collected(domain: &str, council: &str) -> CollectedDomain {
        CollectedDomain {
            domain: domain.to_string(),
            notes: format!("Local authority: {}", council),
            organisation_type_id: "local_authority".to_string(),
        }
    }

    fn document() -> RegistryDocument {
        RegistryDocument {
            version: "0.0.4".to_string(),
            domains: vec![
                entry("leeds.gov.uk", "Local authority: Leeds Council", SOURCE),
                entry("birmingham.gov.uk", "Birmingham", "manual"),
                entry("oldtown.gov.uk", "Local authority: Old Town", SOURCE),
            ],
        }
    }

    #[test]
    fn test_bump_minor_version() {
        assert_eq!(bump_minor_version("0.0.4").unwrap(), "0.1.0");
        assert_eq!(bump_minor_version("1.9.3").unwrap(), "1.10.0");
        assert!(matches!(
            bump_minor_version("1.2"),
            Err(UkpsError::InvalidVersion { .. })
        ));
        assert!(bump_minor_version("1.x.0").is_err());
        assert!(bump_minor_version("1.2.3.4").is_err());
        assert!(matches!(
            bump_minor_version("1.18446744073709551615.0"),
            Err(UkpsError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_merge_respects_source_ownership() {
        let mut doc = document();

        let summary = doc.merge_collected(
            SOURCE,
            &[
                collected("Leeds.gov.uk", "Leeds City Council"),
                collected("birmingham.gov.uk", "Birmingham City Council"),
                collected("manchester.gov.uk", "Manchester City Council"),
            ],
        );

        assert_eq!(summary, MergeSummary { added: 1, updated: 1 });
        assert!(summary.changed());

        let patterns: Vec<&str> = doc.domains.iter().map(|e| e.domain_pattern.as_str()).collect();
        assert_eq!(
            patterns,
            ["birmingham.gov.uk", "leeds.gov.uk", "manchester.gov.uk", "oldtown.gov.uk"]
        );
        assert_eq!(doc.domains[0].notes, "Birmingham");
        assert_eq!(doc.domains[1].notes, "Local authority: Leeds City Council");

        let added = &doc.domains[2];
        assert_eq!(added.source, SOURCE);
        assert_eq!(added.organisation_id, None);
        assert!(added.identifiers.is_empty());
    }

    #[test]
    fn test_merge_without_changes() {
        let mut doc = document();
        let summary = doc.merge_collected(SOURCE, &[collected("leeds.gov.uk", "Leeds Council")]);
        assert!(!summary.changed());
    }

    #[test]
    fn test_merge_matches_normalized_patterns() {
        let mut doc = document();
        doc.domains[0].domain_pattern = "Leeds.gov.uk.".to_string();

        let summary = doc.merge_collected(
            SOURCE,
            &[
                collected("leeds.gov.uk", "Leeds Council"),
                collected(" York.gov.uk. ", "York"),
            ],
        );

        assert_eq!(summary, MergeSummary { added: 1, updated: 0 });
        assert_eq!(doc.domains.len(), 4);
        assert!(doc.domains.iter().any(|e| e.domain_pattern == "york.gov.uk"));

        let crawled: HashSet<String> = ["LEEDS.gov.uk".to_string(), "york.gov.uk".to_string()]
            .into_iter()
            .collect();
        let stale: Vec<&str> = doc
            .find_stale(SOURCE, &crawled)
            .iter()
            .map(|e| e.domain_pattern.as_str())
            .collect();
        assert_eq!(stale, ["oldtown.gov.uk"]);
    }

    #[test]
    fn test_find_and_remove_stale() {
        let mut doc = document();
        let crawled: HashSet<String> = ["leeds.gov.uk".to_string()].into_iter().collect();

        let stale: Vec<&str> = doc
            .find_stale(SOURCE, &crawled)
            .iter()
            .map(|e| e.domain_pattern.as_str())
            .collect();
        assert_eq!(stale, ["oldtown.gov.uk"]);

        assert_eq!(doc.remove_stale(SOURCE, &crawled), 1);
        assert_eq!(doc.domains.len(), 2);
        assert!(doc.domains.iter().any(|e| e.domain_pattern == "birmingham.gov.uk"));
    }

    #[test]
    fn test_document_version_bump() {
        let mut doc = document();
        doc.bump_minor_version().unwrap();
        assert_eq!(doc.version, "0.1.0");
    }

    #[test]
    fn test_duplicate_patterns() {
        let mut doc = document();
        doc.domains.push(entry("LEEDS.gov.uk.", "dup", "manual"));
        assert_eq!(doc.duplicate_patterns(), vec!["leeds.gov.uk".to_string()]);
    }

    #[test]
    fn test_pretty_json_is_sorted_with_trailing_newline() {
        let mut doc = document();
        doc.sort_domains();
        let text = doc.to_pretty_json().unwrap();

        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n    \"domains\": ["));
        assert!(text.contains("\"organisation_id\": null"));
        assert!(text.find("birmingham.gov.uk").unwrap() < text.find("leeds.gov.uk").unwrap());

        // keys are emitted alphabetically within each entry
        let first = &text[text.find("{\n            \"domain_pattern\"").unwrap()..];
        let order = ["domain_pattern", "identifiers", "notes", "organisation_id", "organisation_type_id", "source"];
        let positions: Vec<usize> = order.iter().map(|k| first.find(&format!("\"{}\"", k)).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_reformat_is_idempotent() {
        let unsorted = serde_json::to_string(&document()).unwrap();

        let formatted = RegistryDocument::reformat(&unsorted).unwrap().unwrap();
        assert!(RegistryDocument::reformat(&formatted).unwrap().is_none());
    }

    #[test]
    fn test_reformat_keeps_unknown_keys() {
        let original = r#"{"version": "0.2.0", "domains": [
            {"source": "manual", "domain_pattern": "b.gov.uk", "contact": "ops@b.gov.uk"},
            {"domain_pattern": "a.gov.uk", "notes": "A", "identifiers": {"ons": "E1"}}
        ], "maintainer": "registry team"}"#;

        let formatted = RegistryDocument::reformat(original).unwrap().unwrap();
        let value: Value = serde_json::from_str(&formatted).unwrap();

        assert_eq!(value["maintainer"], "registry team");
        assert_eq!(value["domains"][0]["domain_pattern"], "a.gov.uk");
        assert_eq!(value["domains"][0]["identifiers"]["ons"], "E1");
        assert_eq!(value["domains"][1]["contact"], "ops@b.gov.uk");
        assert!(value["domains"][1].get("notes").is_none());

        assert!(formatted.starts_with("{\n    \"version\": \"0.2.0\","));
        // entry keys are alphabetical, so `contact` precedes `domain_pattern`
        assert!(formatted.find("\"contact\"").unwrap() < formatted.find("\"b.gov.uk\"").unwrap());

        assert!(RegistryDocument::reformat(&formatted).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_format_registry_file_through_storage() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let unsorted = r#"{"version": "0.1.0", "domains": [{"domain_pattern": "b.gov.uk", "contact": "ops@b.gov.uk"}, {"domain_pattern": "a.gov.uk"}]}"#;
        storage
            .write_file("user_domains.json", unsorted.as_bytes())
            .await
            .unwrap();

        let outcome = format_registry_file(&storage, "user_domains.json", true).await.unwrap();
        assert_eq!(outcome, FormatOutcome::NeedsFormatting);
        let untouched = std::fs::read_to_string(storage.base_path().join("user_domains.json")).unwrap();
        assert_eq!(untouched, unsorted);

        let outcome = format_registry_file(&storage, "user_domains.json", false).await.unwrap();
        assert_eq!(outcome, FormatOutcome::Formatted);
        let written = std::fs::read_to_string(temp_dir.path().join("user_domains.json")).unwrap();
        assert!(written.contains("\"contact\": \"ops@b.gov.uk\""));
        assert!(written.find("a.gov.uk").unwrap() < written.find("b.gov.uk").unwrap());

        let outcome = format_registry_file(&storage, "user_domains.json", false).await.unwrap();
        assert_eq!(outcome, FormatOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_format_registry_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let result = format_registry_file(&storage, "user_domains.json", false).await;
        assert!(matches!(result, Err(UkpsError::IoError(_))));
    }
}
