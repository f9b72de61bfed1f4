use crate::domain::ports::Transport;
use crate::utils::error::{Result, UkpsError};
use reqwest::Client;
use std::time::Duration;

/// `Transport` backed by a reqwest client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ukps-domains/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UkpsError::ConfigError {
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        tracing::debug!("Response status for {}: {}", url, status);
        if !status.is_success() {
            return Err(UkpsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
