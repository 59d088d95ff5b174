//! Desired catalog entry: the node, its service, and whether it should exist.

use consul_client::{AgentService, CatalogDeregistration, CatalogRegistration};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether the node/service should be in the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Present => f.write_str("present"),
            DesiredState::Absent => f.write_str("absent"),
        }
    }
}

impl FromStr for DesiredState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(DesiredState::Present),
            "absent" => Ok(DesiredState::Absent),
            other => Err(format!("invalid state '{other}', expected one of: present, absent")),
        }
    }
}

/// Catalog node, identified by name within a datacenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub node: String,
    pub address: Option<String>,
}

/// Service attached to the node.
///
/// The ID should be unique per node; that is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub id: String,
    pub port: u16,
    pub tags: Vec<String>,
}

/// Node plus service, as requested by one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTarget {
    pub node: NodeSpec,
    pub service: ServiceSpec,
}

impl CatalogTarget {
    /// Registration body for this target
    pub fn registration(&self, datacenter: Option<&str>) -> CatalogRegistration {
        CatalogRegistration {
            datacenter: datacenter.map(str::to_string),
            node: self.node.node.clone(),
            address: self.node.address.clone(),
            service: AgentService {
                service: self.service.name.clone(),
                id: self.service.id.clone(),
                tags: self.service.tags.clone(),
                port: self.service.port,
            },
        }
    }

    /// Deregistration body for this target.
    ///
    /// Only the service ID is used. An empty ID is left out, which makes
    /// Consul drop the whole node.
    pub fn deregistration(&self, datacenter: Option<&str>) -> CatalogDeregistration {
        CatalogDeregistration {
            datacenter: datacenter.map(str::to_string),
            node: self.node.node.clone(),
            service_id: Some(self.service.id.clone()).filter(|id| !id.is_empty()),
        }
    }
}
