use std::path::Path;
use std::time::Duration;

use cask_common::{CaskError, CaskResult};
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::manifest::{ACCEPTED_MEDIA_TYPES, Manifest};
use crate::reference::ImageReference;

/// Where and how to reach the registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry API base URL (without `/v2`).
    pub registry_url: String,
    /// Token endpoint URL.
    pub auth_url: String,
    /// `service` parameter sent to the token endpoint.
    pub service: String,
    /// TCP connect deadline for every request.
    pub connect_timeout: Duration,
    /// Overall deadline for every request, body included.
    pub request_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_url: Self::DOCKER_HUB_URL.to_string(),
            auth_url: Self::DOCKER_HUB_AUTH_URL.to_string(),
            service: Self::DOCKER_HUB_SERVICE.to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl RegistryConfig {
    /// Docker Hub registry API.
    pub const DOCKER_HUB_URL: &'static str = "https://registry.hub.docker.com";
    /// Docker Hub token endpoint.
    pub const DOCKER_HUB_AUTH_URL: &'static str = "https://auth.docker.io/token";
    /// Docker Hub token service name.
    pub const DOCKER_HUB_SERVICE: &'static str = "registry.docker.io";

    /// Set the registry API base URL.
    #[must_use]
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the token endpoint URL.
    #[must_use]
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Set the token service name.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the connect and request deadlines.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }
}

/// Bearer token for a single repository scope.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryToken(String);

impl RegistryToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RegistryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RegistryToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    // Some registries use access_token
    access_token: Option<String>,
}

/// Registry client for pulling images.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    config: RegistryConfig,
}

impl RegistryClient {
    /// Create a new registry client.
    pub fn new(config: RegistryConfig) -> CaskResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CaskError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    /// Create a client for Docker Hub.
    pub fn docker_hub() -> CaskResult<Self> {
        Self::new(RegistryConfig::default())
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Token scope requested for `reference`.
    #[must_use]
    pub fn scope(reference: &ImageReference) -> String {
        format!("repository:{}:pull,push", reference.name())
    }

    /// Exchange the reference for an anonymous bearer token.
    pub async fn fetch_token(&self, reference: &ImageReference) -> CaskResult<RegistryToken> {
        let scope = Self::scope(reference);
        tracing::debug!(url = %self.config.auth_url, scope = %scope, "Requesting token");

        let response = self
            .client
            .get(&self.config.auth_url)
            .query(&[("service", self.config.service.as_str()), ("scope", scope.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error("requesting token", &e))?;
        let body = check_status(response)?
            .bytes()
            .await
            .map_err(|e| self.transport_error("reading token response", &e))?;

        let token_resp: TokenResponse =
            serde_json::from_slice(&body).map_err(|e| CaskError::Decode {
                what: "token response",
                message: e.to_string(),
            })?;

        token_resp
            .token
            .or(token_resp.access_token)
            .filter(|t| !t.is_empty())
            .map(RegistryToken)
            .ok_or_else(|| CaskError::Decode {
                what: "token response",
                message: "No token in response".to_string(),
            })
    }

    /// Fetch and decode the `latest` manifest.
    pub async fn fetch_manifest(
        &self,
        reference: &ImageReference,
        token: &RegistryToken,
    ) -> CaskResult<Manifest> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.config.registry_url,
            reference.name(),
            reference.tag
        );
        tracing::debug!(url = %url, "Getting manifest");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, ACCEPTED_MEDIA_TYPES.join(", "))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| self.transport_error("requesting manifest", &e))?;
        let body = check_status(response)?
            .bytes()
            .await
            .map_err(|e| self.transport_error("reading manifest", &e))?;

        Manifest::from_slice(&body)
    }

    /// Download one blob into `dest`, returning the number of bytes written.
    pub async fn download_blob(
        &self,
        reference: &ImageReference,
        token: &RegistryToken,
        digest: &str,
        dest: &Path,
    ) -> CaskResult<u64> {
        let url = format!(
            "{}/v2/{}/blobs/{}",
            self.config.registry_url,
            reference.name(),
            digest
        );
        tracing::debug!(url = %url, dest = %dest.display(), "Getting blob");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| self.transport_error("requesting blob", &e))?;
        let response = check_status(response)?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(CaskError::filesystem("create", dest))?;
        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| self.transport_error("downloading blob", &e))?;
            file.write_all(&chunk)
                .await
                .map_err(CaskError::filesystem("write", dest))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(CaskError::filesystem("write", dest))?;

        Ok(written)
    }

    fn transport_error(&self, operation: &'static str, err: &reqwest::Error) -> CaskError {
        if err.is_timeout() {
            CaskError::Timeout {
                operation,
                seconds: self.config.request_timeout.as_secs(),
            }
        } else {
            CaskError::Network {
                message: format!("{operation} failed: {err}"),
            }
        }
    }
}

fn check_status(response: Response) -> CaskResult<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(CaskError::Registry {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}
