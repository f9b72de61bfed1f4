pub mod curation;
pub mod loader;
pub mod lookup;
pub mod registry;
pub mod snapshot;

pub use crate::domain::model::{
    DataSource, DomainEntry, DomainMatch, LookupOptions, OrganisationDirectory,
    RegistryDocument, WildcardStrategy,
};
pub use crate::domain::ports::{Storage, Transport};
pub use crate::utils::error::Result;
