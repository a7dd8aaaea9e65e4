//! Docker Engine API adapter
//!
//! Speaks the swarm subset of the Engine API (`/networks`, `/services`,
//! `/tasks`, `/nodes`) over plain HTTP. The engine has to be exposed on a TCP
//! endpoint; `unix://` sockets are rejected when the client is built.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::types::{
    NetworkCreateRequest, NetworkCreated, NetworkSummary, NodeRecord, ServiceCreated,
    ServiceRecord, ServiceSpec, TaskFilter, TaskRecord,
};
use super::{PlatformClient, PlatformError};

/// Engine API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "v1.43";

/// Turn a `DOCKER_HOST`-style address into an HTTP base URL
///
/// `tcp://host:port` becomes `http://host:port`; `http(s)://` passes through.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, PlatformError> {
    let endpoint = endpoint.trim().trim_end_matches('/');

    if let Some(rest) = endpoint.strip_prefix("tcp://") {
        return Ok(format!("http://{}", rest));
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return Ok(endpoint.to_string());
    }
    if endpoint.starts_with("unix://") || endpoint.starts_with("npipe://") {
        return Err(PlatformError::Unavailable(format!(
            "socket endpoints are not supported, expose the engine over TCP: {}",
            endpoint
        )));
    }

    Err(PlatformError::Unavailable(format!(
        "unrecognised platform endpoint: {}",
        endpoint
    )))
}

#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    message: String,
}

// ============================================================================
// SBIO: I/O implementation (real HTTP client)
// ============================================================================

#[derive(Clone)]
pub struct DockerClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl DockerClient {
    /// Build a client for the given engine endpoint
    ///
    /// Fails with [`PlatformError::Unavailable`] when the endpoint is not
    /// usable or the HTTP client cannot be constructed.
    pub fn new(
        endpoint: &str,
        api_version: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, PlatformError> {
        let base_url = normalize_endpoint(endpoint)?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PlatformError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_version: api_version.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.api_version.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, PlatformError> {
        let response = req.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                PlatformError::Unavailable(e.to_string())
            } else {
                PlatformError::Api {
                    status: 0,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<EngineErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);

        Err(match status.as_u16() {
            404 => PlatformError::NotFound(message),
            409 => PlatformError::Conflict(message),
            // Engine answers 503 when the node is not part of a swarm
            503 => PlatformError::Unavailable(message),
            code => PlatformError::Api {
                status: code,
                message,
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, PlatformError> {
        let response = self.send(req).await?;
        response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PlatformClient for DockerClient {
    async fn list_networks(&self) -> Result<Vec<NetworkSummary>, PlatformError> {
        self.get_json(self.client.get(self.url("networks"))).await
    }

    async fn create_network(
        &self,
        request: &NetworkCreateRequest,
    ) -> Result<NetworkCreated, PlatformError> {
        debug!(network = %request.name, driver = %request.driver, "Creating network");
        self.get_json(self.client.post(self.url("networks/create")).json(request))
            .await
    }

    async fn remove_network(&self, id: &str) -> Result<(), PlatformError> {
        self.send(self.client.delete(self.url(&format!("networks/{}", id))))
            .await?;
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<ServiceRecord>, PlatformError> {
        self.get_json(self.client.get(self.url("services"))).await
    }

    async fn create_service(&self, spec: &ServiceSpec) -> Result<ServiceCreated, PlatformError> {
        debug!(service = %spec.name, "Creating service");
        self.get_json(self.client.post(self.url("services/create")).json(spec))
            .await
    }

    async fn remove_service(&self, id: &str) -> Result<(), PlatformError> {
        self.send(self.client.delete(self.url(&format!("services/{}", id))))
            .await?;
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, PlatformError> {
        let mut req = self.client.get(self.url("tasks"));
        if !filter.service_ids.is_empty() {
            let filters = serde_json::json!({ "service": filter.service_ids });
            req = req.query(&[("filters", filters.to_string())]);
        }
        self.get_json(req).await
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, PlatformError> {
        self.get_json(self.client.get(self.url("nodes"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tcp_endpoint() {
        assert_eq!(
            normalize_endpoint("tcp://10.0.0.5:2375").unwrap(),
            "http://10.0.0.5:2375"
        );
    }

    #[test]
    fn test_normalize_http_endpoint_strips_trailing_slash() {
        assert_eq!(
            normalize_endpoint("https://swarm.internal:2376/").unwrap(),
            "https://swarm.internal:2376"
        );
    }

    #[test]
    fn test_normalize_rejects_unix_socket() {
        let result = normalize_endpoint("unix:///var/run/docker.sock");
        assert!(matches!(result, Err(PlatformError::Unavailable(_))));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_endpoint("swarm.internal").is_err());
    }

    #[test]
    fn test_versioned_url() {
        let timeout = Some(Duration::from_secs(5));
        let client = DockerClient::new("tcp://127.0.0.1:2375", "v1.43", timeout).unwrap();

        assert_eq!(client.base_url(), "http://127.0.0.1:2375");
        assert_eq!(
            client.url("services/create"),
            "http://127.0.0.1:2375/v1.43/services/create"
        );
    }

    #[test]
    fn test_client_without_deadline() {
        let client = DockerClient::new("tcp://127.0.0.1:2375", "v1.43", None).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:2375");
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_unavailable() {
        // Port 9 (discard) is closed on test machines
        let timeout = Some(Duration::from_secs(2));
        let client = DockerClient::new("http://127.0.0.1:9", "v1.43", timeout).unwrap();

        let result = client.list_services().await;
        assert!(matches!(result, Err(PlatformError::Unavailable(_))));
    }
}
