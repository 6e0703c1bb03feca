use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, ETAG, IF_NONE_MATCH};
use reqwest::Client;
use url::Url;

use super::{Transport, TransportResponse};
use crate::errors::{ConfigError, LiveStoreError};

/// Upper bound for a single request. The live store has no watchdog of its
/// own, so this is the only thing that ends a hung request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("stables-live-store/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] backed by a shared `reqwest` client.
///
/// Cookies set by the API are stored and sent back on every request, which
/// is how the session travels.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Self::with_client(base_url, client)
    }

    /// Uses an existing client, e.g. one that already carries a session.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self, ConfigError> {
        // Without the trailing slash `Url::join` would replace the last
        // path segment instead of appending to it.
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, LiveStoreError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| LiveStoreError::InvalidUrl(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        path: &str,
        validator: Option<&str>,
    ) -> Result<TransportResponse, LiveStoreError> {
        let url = self.url_for(path)?;
        debug!("GET {} (validator: {:?})", url, validator);

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(validator) = validator {
            request = request.header(IF_NONE_MATCH, validator);
        }

        let response = request.send().await.map_err(|e| classify(e, path))?;
        let status = response.status().as_u16();
        let validator = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(e, path))?
            .to_vec();

        Ok(TransportResponse {
            status,
            validator,
            body,
        })
    }
}

fn classify(error: reqwest::Error, path: &str) -> LiveStoreError {
    if error.is_timeout() {
        LiveStoreError::Timeout {
            resource: path.to_string(),
        }
    } else {
        LiveStoreError::Network(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_its_path() {
        let transport = HttpTransport::new("https://game.example/api/v1").unwrap();
        assert_eq!(
            transport.url_for("horses").unwrap().as_str(),
            "https://game.example/api/v1/horses"
        );
        assert_eq!(
            transport.url_for("/horses/next-energy-recovery").unwrap().as_str(),
            "https://game.example/api/v1/horses/next-energy-recovery"
        );
    }

    #[test]
    fn test_rejects_relative_base_url() {
        assert!(matches!(
            HttpTransport::new("api/v1"),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            HttpTransport::new("mailto:stables@example.com"),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }
}
