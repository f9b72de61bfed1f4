//! Domain normalization and resolution against a [`Snapshot`].
//!
//! Resolution is exact-match-first: a literal pattern equal to the normalized
//! domain always wins, whatever its position in the registry. Otherwise every
//! `*.suffix` pattern whose suffix ends the domain is a candidate, and the
//! [`WildcardStrategy`] picks one. `LastMatch` keeps the last candidate in
//! registry order, which is what existing registry data is ordered for;
//! `MostSpecific` picks the longest suffix instead.

use crate::core::snapshot::Snapshot;
use crate::domain::model::{DomainEntry, DomainMatch, LookupOptions, WildcardStrategy};
use crate::utils::error::{Result, UkpsError};

/// Trim, lower-case and drop one trailing dot.
pub(crate) fn normalize_pattern(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    match lowered.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => lowered,
    }
}

/// Canonical form of a domain; fails when the result is empty or has no `.`.
pub fn normalize(input: &str) -> Result<String> {
    let domain = normalize_pattern(input);
    if domain.is_empty() || !domain.contains('.') {
        return Err(UkpsError::invalid_domain(input));
    }
    Ok(domain)
}

/// The normalized domain after the last `@` of an email address.
pub fn domain_from_email(email: &str) -> Result<String> {
    let (local, domain) = email
        .trim()
        .rsplit_once('@')
        .ok_or_else(|| UkpsError::invalid_domain(email))?;

    if local.trim().is_empty() {
        return Err(UkpsError::invalid_domain(email));
    }

    normalize(domain).map_err(|_| UkpsError::invalid_domain(email))
}

/// Finds the entry for an already-normalized domain.
pub fn find<'a>(
    snapshot: &'a Snapshot,
    domain: &str,
    strategy: WildcardStrategy,
) -> Option<&'a DomainEntry> {
    if let Some(entry) = snapshot.exact_match(domain) {
        return Some(entry);
    }

    let candidates = snapshot.wildcard_entries().filter_map(|entry| {
        entry
            .wildcard_suffix()
            .filter(|suffix| domain.ends_with(suffix))
            .map(|suffix| (suffix.len(), entry))
    });

    match strategy {
        WildcardStrategy::LastMatch => candidates.last().map(|(_, entry)| entry),
        // max_by_key returns the last of equal maxima, so later entries win ties
        WildcardStrategy::MostSpecific => candidates
            .max_by_key(|(suffix_len, _)| *suffix_len)
            .map(|(_, entry)| entry),
    }
}

impl Snapshot {
    pub fn resolve(&self, domain: &str, options: LookupOptions) -> Result<Option<DomainMatch>> {
        let domain = normalize(domain)?;

        let Some(entry) = find(self, &domain, options.strategy) else {
            tracing::debug!("No registry match for {}", domain);
            return Ok(None);
        };

        let organisation = if options.enrich {
            entry
                .organisation_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .and_then(|id| {
                    let record = self.organisations().get(id);
                    if record.is_none() {
                        tracing::debug!("No organisation record for {}", id);
                    }
                    record.cloned()
                })
        } else {
            None
        };

        Ok(Some(DomainMatch {
            entry: entry.clone(),
            organisation,
        }))
    }

    pub fn resolve_email(&self, email: &str, options: LookupOptions) -> Result<Option<DomainMatch>> {
        let domain = domain_from_email(email)?;
        self.resolve(&domain, options)
    }
}
