pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::LoaderConfig;

pub use crate::adapters::{HttpTransport, LocalStorage};
pub use crate::core::{
    curation::{
        bump_minor_version, format_registry_file, CollectedDomain, FormatOutcome, MergeSummary,
    },
    loader::RegistryLoader,
    lookup::{domain_from_email, normalize},
    registry::UkpsDomains,
    snapshot::Snapshot,
};
pub use crate::domain::model::{
    DataSource, DomainEntry, DomainMatch, LookupOptions, OrganisationDirectory, RegistryDocument,
    WildcardStrategy,
};
pub use crate::domain::ports::{Storage, Transport};
pub use crate::utils::error::{Result, UkpsError};
