//! ConsulClient trait for mocking
//!
//! This trait abstracts the ConsulClient to enable mocking in unit tests.
//! The concrete ConsulClient implements this trait, and tests can use mock implementations.

use crate::error::ConsulError;
use crate::models::*;

/// Trait for Consul catalog operations
///
/// All async methods must be `Send` to work with Tokio's runtime.
#[async_trait::async_trait]
pub trait ConsulClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// List the nodes known in a datacenter, in the order Consul returns them
    async fn list_nodes(&self, datacenter: Option<&str>) -> Result<Vec<CatalogNode>, ConsulError>;

    /// Fetch one node and its services, `None` if the node is unknown
    async fn get_node(&self, node: &str, datacenter: Option<&str>) -> Result<Option<CatalogNodeServices>, ConsulError>;

    /// Create or update a node and its service entry (upsert)
    async fn register_node(&self, registration: &CatalogRegistration) -> Result<serde_json::Value, ConsulError>;

    /// Remove a service from a node (or the whole node when no service ID is given)
    async fn deregister_service(&self, deregistration: &CatalogDeregistration) -> Result<serde_json::Value, ConsulError>;
}
