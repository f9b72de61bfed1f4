use crate::adapters::{HttpTransport, LocalStorage};
use crate::config::LoaderConfig;
use crate::core::snapshot::Snapshot;
use crate::domain::model::DataSource;
use crate::domain::ports::{Storage, Transport};
use crate::utils::error::{Result, UkpsError};

/// Loads both registry documents, remote first, then the local directory.
///
/// Each attempt is all-or-nothing: a snapshot is only built when every
/// document came from the same source.
pub struct RegistryLoader<T: Transport, S: Storage> {
    transport: T,
    storage: S,
    config: LoaderConfig,
}

impl RegistryLoader<HttpTransport, LocalStorage> {
    pub fn from_config(config: LoaderConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.remote_timeout())?;
        let storage = LocalStorage::new(config.local_directory.clone());
        Ok(Self::new(transport, storage, config))
    }
}

impl<T: Transport, S: Storage> RegistryLoader<T, S> {
    pub fn new(transport: T, storage: S, config: LoaderConfig) -> Self {
        Self {
            transport,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub async fn load(&self) -> Result<Snapshot> {
        self.load_with(self.config.allow_remote).await
    }

    pub async fn load_with(&self, allow_remote: bool) -> Result<Snapshot> {
        let remote_failure = if allow_remote {
            match self.load_remote().await {
                Ok(snapshot) => {
                    tracing::info!(
                        "Loaded registry v{} from remote ({} entries)",
                        snapshot.version(),
                        snapshot.len()
                    );
                    return Ok(snapshot);
                }
                Err(e) => {
                    tracing::warn!("Remote load failed, falling back to local: {}", e);
                    e.to_string()
                }
            }
        } else {
            tracing::debug!("Remote loading disabled");
            "remote loading disabled".to_string()
        };

        match self.load_local().await {
            Ok(snapshot) => {
                tracing::info!(
                    "Loaded registry v{} from local directory ({} entries)",
                    snapshot.version(),
                    snapshot.len()
                );
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!("Local load failed: {}", e);
                Err(UkpsError::DataUnavailable {
                    remote: remote_failure,
                    local: e.to_string(),
                })
            }
        }
    }

    async fn load_remote(&self) -> Result<Snapshot> {
        let [registry_file, organisations_file] = self.config.files();

        let registry = self
            .transport
            .fetch(&self.config.remote_url_for(registry_file))
            .await?;
        let organisations = self
            .transport
            .fetch(&self.config.remote_url_for(organisations_file))
            .await?;

        Snapshot::from_json(
            registry_file,
            &registry,
            organisations_file,
            &organisations,
            DataSource::Remote,
        )
    }

    async fn load_local(&self) -> Result<Snapshot> {
        let [registry_file, organisations_file] = self.config.files();

        let registry = self.storage.read_file(registry_file).await?;
        let organisations = self.storage.read_file(organisations_file).await?;

        Snapshot::from_json(
            registry_file,
            &registry,
            organisations_file,
            &organisations,
            DataSource::Local,
        )
    }
}
