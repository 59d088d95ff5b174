//! Consul catalog API models
//!
//! These models match the JSON bodies of the `/v1/catalog` endpoints.
//! See: https://developer.hashicorp.com/consul/api-docs/catalog

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node as returned by `GET /v1/catalog/nodes`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogNode {
    #[serde(rename = "ID", default)]
    pub id: String,
    pub node: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub datacenter: String,
    #[serde(default)]
    pub tagged_addresses: Option<HashMap<String, String>>,
    #[serde(default)]
    pub meta: Option<HashMap<String, String>>,
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
}

/// Service entry attached to a node in a registration request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentService {
    pub service: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub port: u16,
}

/// Request body for `PUT /v1/catalog/register`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogRegistration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub service: AgentService,
}

/// Request body for `PUT /v1/catalog/deregister`
///
/// Without a `ServiceID` Consul removes the node and everything attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogDeregistration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
    pub node: String,
    #[serde(rename = "ServiceID", skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

/// Service as listed under a node by `GET /v1/catalog/node/:node`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeService {
    #[serde(rename = "ID")]
    pub id: String,
    pub service: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub address: String,
}

/// Body of `GET /v1/catalog/node/:node`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogNodeServices {
    pub node: CatalogNode,
    #[serde(default)]
    pub services: HashMap<String, NodeService>,
}
