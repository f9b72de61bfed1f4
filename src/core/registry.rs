//! The published registry: a loader plus the current [`Snapshot`].
//!
//! Readers take an `Arc` of the current snapshot through `ArcSwapOption` and
//! never lock. `refresh` builds a complete snapshot first and only then
//! stores it, so a concurrent lookup sees either the old or the new registry.
//! A failed refresh leaves the previous snapshot published.

use crate::adapters::{HttpTransport, LocalStorage};
use crate::config::LoaderConfig;
use crate::core::loader::RegistryLoader;
use crate::core::snapshot::Snapshot;
use crate::domain::model::{DataSource, DomainMatch, LookupOptions, WildcardStrategy};
use crate::domain::ports::{Storage, Transport};
use crate::utils::error::{Result, UkpsError};
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct UkpsDomains<T: Transport = HttpTransport, S: Storage = LocalStorage> {
    loader: RegistryLoader<T, S>,
    current: ArcSwapOption<Snapshot>,
    allow_remote: AtomicBool,
    strategy: WildcardStrategy,
}

impl UkpsDomains<HttpTransport, LocalStorage> {
    /// Builds the production handle and performs the initial load.
    pub async fn connect(config: LoaderConfig) -> Result<Self> {
        let domains = Self::from_config(config)?;
        domains.refresh().await?;
        Ok(domains)
    }

    /// Builds the production handle without loading anything yet.
    pub fn from_config(config: LoaderConfig) -> Result<Self> {
        Ok(Self::new(RegistryLoader::from_config(config)?))
    }
}

impl<T: Transport, S: Storage> UkpsDomains<T, S> {
    pub fn new(loader: RegistryLoader<T, S>) -> Self {
        let allow_remote = AtomicBool::new(loader.config().allow_remote);
        let strategy = loader.config().wildcard_strategy;
        Self {
            loader,
            current: ArcSwapOption::empty(),
            allow_remote,
            strategy,
        }
    }

    /// Reloads both documents and publishes the result.
    pub async fn refresh(&self) -> Result<DataSource> {
        let snapshot = self
            .loader
            .load_with(self.allow_remote.load(Ordering::Acquire))
            .await?;
        let source = snapshot.source();
        self.current.store(Some(Arc::new(snapshot)));
        tracing::debug!("Published new registry snapshot from {}", source);
        Ok(source)
    }

    /// Changes the remote capability for this and later refreshes.
    pub async fn refresh_with(&self, allow_remote: bool) -> Result<DataSource> {
        self.allow_remote.store(allow_remote, Ordering::Release);
        self.refresh().await
    }

    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.current.load_full().ok_or(UkpsError::NotLoaded)
    }

    pub fn data_source(&self) -> Option<DataSource> {
        self.current.load_full().map(|snapshot| snapshot.source())
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn default_options(&self) -> LookupOptions {
        LookupOptions {
            enrich: true,
            strategy: self.strategy,
        }
    }

    /// Resolves a domain with enrichment, using the configured wildcard strategy.
    pub fn resolve(&self, domain: &str) -> Result<Option<DomainMatch>> {
        self.resolve_with(domain, self.default_options())
    }

    pub fn resolve_with(&self, domain: &str, options: LookupOptions) -> Result<Option<DomainMatch>> {
        self.snapshot()?.resolve(domain, options)
    }

    pub fn resolve_email(&self, email: &str) -> Result<Option<DomainMatch>> {
        self.resolve_email_with(email, self.default_options())
    }

    pub fn resolve_email_with(
        &self,
        email: &str,
        options: LookupOptions,
    ) -> Result<Option<DomainMatch>> {
        self.snapshot()?.resolve_email(email, options)
    }

    /// `Ok(false)` for a well-formed but unregistered domain.
    pub fn is_known_domain(&self, domain: &str) -> Result<bool> {
        let found = self.resolve_with(domain, LookupOptions::without_enrichment(self.strategy))?;
        Ok(is_registered(found))
    }

    pub fn is_known_email(&self, email: &str) -> Result<bool> {
        let found =
            self.resolve_email_with(email, LookupOptions::without_enrichment(self.strategy))?;
        Ok(is_registered(found))
    }
}

fn is_registered(found: Option<DomainMatch>) -> bool {
    found.is_some_and(|m| !m.entry.domain_pattern.is_empty())
}
