//! Consul API client
//!
//! Implements the catalog half of the Consul HTTP API:
//! /v1/catalog/nodes, /v1/catalog/node/:node, /v1/catalog/register and /v1/catalog/deregister

use crate::common::HttpClient;
use crate::config::ConnectionConfig;
use crate::consul_trait::ConsulClientTrait;
use crate::error::ConsulError;
use crate::models::*;
use reqwest::Client;
use tracing::debug;

/// Consul API client
pub struct ConsulClient {
    http: HttpClient,
    datacenter: Option<String>,
}

impl ConsulClient {
    /// Create a new Consul client from connection settings
    ///
    /// No request is made here; an unreachable agent only shows up on the first call.
    ///
    /// # Errors
    /// Returns `ConsulError::Connection` if the host/port/scheme combination is
    /// malformed or the HTTP transport cannot be initialized.
    pub fn connect(config: ConnectionConfig) -> Result<Self, ConsulError> {
        let base_url = config.base_url()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ConsulError::Connection(format!("Failed to build HTTP client: {e}")))?;

        debug!(
            "Connected Consul client to {} (verify TLS: {})",
            base_url, config.verify_tls
        );

        Ok(Self {
            http: HttpClient::new(client, base_url, config.token),
            datacenter: config.datacenter.filter(|dc| !dc.is_empty()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Datacenter configured on the connection, used when a call does not name one
    pub fn datacenter(&self) -> Option<&str> {
        self.datacenter.as_deref()
    }

    fn dc_query<'a>(&'a self, datacenter: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
        datacenter
            .or(self.datacenter.as_deref())
            .filter(|dc| !dc.is_empty())
            .map(|dc| vec![("dc", dc)])
            .unwrap_or_default()
    }

    /// List the nodes registered in a datacenter
    ///
    /// # Arguments
    /// * `datacenter` - Datacenter to query; falls back to the connection's datacenter
    ///
    /// # Returns
    /// * `Ok(Vec<CatalogNode>)` - Nodes in server order
    /// * `Err(ConsulError)` - If the request fails
    pub async fn list_nodes(&self, datacenter: Option<&str>) -> Result<Vec<CatalogNode>, ConsulError> {
        debug!("Listing catalog nodes");
        self.http.get("/v1/catalog/nodes", &self.dc_query(datacenter)).await
    }

    /// Get a node and the services registered on it
    ///
    /// # Returns
    /// * `Ok(Some(CatalogNodeServices))` - The node exists
    /// * `Ok(None)` - The node is not in the catalog
    /// * `Err(ConsulError)` - If the request fails
    pub async fn get_node(
        &self,
        node: &str,
        datacenter: Option<&str>,
    ) -> Result<Option<CatalogNodeServices>, ConsulError> {
        let path = format!("/v1/catalog/node/{}", urlencoding::encode(node));
        debug!("Fetching catalog node {}", node);
        self.http.get_optional(&path, &self.dc_query(datacenter)).await
    }

    /// Register a node with a service entry
    ///
    /// Consul treats this as an upsert and gives no create-vs-update signal;
    /// the raw response body (normally `true`) is returned as-is.
    pub async fn register_node(&self, registration: &CatalogRegistration) -> Result<serde_json::Value, ConsulError> {
        let mut body = registration.clone();
        if body.datacenter.as_deref().is_none_or(str::is_empty) {
            body.datacenter = self.datacenter.clone();
        }
        debug!("Registering node {} with service {}", body.node, body.service.id);
        self.http.put("/v1/catalog/register", &body).await
    }

    /// Deregister a service from a node
    ///
    /// Consul answers success even when the service does not exist.
    pub async fn deregister_service(
        &self,
        deregistration: &CatalogDeregistration,
    ) -> Result<serde_json::Value, ConsulError> {
        let mut body = deregistration.clone();
        if body.datacenter.as_deref().is_none_or(str::is_empty) {
            body.datacenter = self.datacenter.clone();
        }
        debug!(
            "Deregistering service {} from node {}",
            body.service_id.as_deref().unwrap_or("<all>"),
            body.node
        );
        self.http.put("/v1/catalog/deregister", &body).await
    }
}

#[async_trait::async_trait]
impl ConsulClientTrait for ConsulClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn list_nodes(&self, datacenter: Option<&str>) -> Result<Vec<CatalogNode>, ConsulError> {
        self.list_nodes(datacenter).await
    }

    async fn get_node(&self, node: &str, datacenter: Option<&str>) -> Result<Option<CatalogNodeServices>, ConsulError> {
        self.get_node(node, datacenter).await
    }

    async fn register_node(&self, registration: &CatalogRegistration) -> Result<serde_json::Value, ConsulError> {
        self.register_node(registration).await
    }

    async fn deregister_service(&self, deregistration: &CatalogDeregistration) -> Result<serde_json::Value, ConsulError> {
        self.deregister_service(deregistration).await
    }
}
