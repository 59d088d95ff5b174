//! Mock ConsulClient for unit testing
//!
//! This module provides a mock implementation of ConsulClientTrait that can be used
//! in unit tests without requiring a running Consul agent.

use crate::consul_trait::ConsulClientTrait;
use crate::error::ConsulError;
use crate::models::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// A call recorded by the mock, in the order it was made
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    ListNodes(Option<String>),
    GetNode(String),
    Register(CatalogRegistration),
    Deregister(CatalogDeregistration),
}

/// Mock ConsulClient for testing
///
/// Keeps an in-memory catalog with Consul's upsert/deregister semantics
/// and records every call so tests can assert on what was sent.
#[derive(Clone)]
pub struct MockConsulClient {
    base_url: String,
    // Node name -> node entry, ordered like Consul's listing
    nodes: Arc<Mutex<BTreeMap<String, CatalogNodeServices>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockConsulClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            nodes: Arc::new(Mutex::new(BTreeMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Add a bare node to the mock catalog (for test setup)
    pub fn add_node(&self, name: &str, address: &str) {
        self.nodes.lock().unwrap().insert(
            name.to_string(),
            CatalogNodeServices {
                node: CatalogNode {
                    node: name.to_string(),
                    address: address.to_string(),
                    ..Default::default()
                },
                services: HashMap::new(),
            },
        );
    }

    /// Make every following call fail with an API error (for test setup)
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }

    /// Whether a node is currently in the mock catalog
    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.lock().unwrap().contains_key(name)
    }

    /// Services currently registered on a node
    pub fn services(&self, name: &str) -> Vec<NodeService> {
        self.nodes
            .lock()
            .unwrap()
            .get(name)
            .map(|n| n.services.values().cloned().collect())
            .unwrap_or_default()
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Registrations sent so far
    pub fn register_calls(&self) -> Vec<CatalogRegistration> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Register(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Deregistrations sent so far
    pub fn deregister_calls(&self) -> Vec<CatalogDeregistration> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Deregister(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) -> Result<(), ConsulError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(ConsulError::Api {
                status: 500,
                body: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ConsulClientTrait for MockConsulClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_nodes(&self, datacenter: Option<&str>) -> Result<Vec<CatalogNode>, ConsulError> {
        self.record(MockCall::ListNodes(datacenter.map(str::to_string)))?;
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes.values().map(|n| n.node.clone()).collect())
    }

    async fn get_node(&self, node: &str, _datacenter: Option<&str>) -> Result<Option<CatalogNodeServices>, ConsulError> {
        self.record(MockCall::GetNode(node.to_string()))?;
        Ok(self.nodes.lock().unwrap().get(node).cloned())
    }

    async fn register_node(&self, registration: &CatalogRegistration) -> Result<serde_json::Value, ConsulError> {
        self.record(MockCall::Register(registration.clone()))?;

        let mut nodes = self.nodes.lock().unwrap();
        let entry = nodes
            .entry(registration.node.clone())
            .or_insert_with(|| CatalogNodeServices {
                node: CatalogNode {
                    node: registration.node.clone(),
                    ..Default::default()
                },
                services: HashMap::new(),
            });
        entry.node.address = registration.address.clone().unwrap_or_default();

        let service = &registration.service;
        // Consul falls back to the service name when no ID is given
        let id = if service.id.is_empty() { service.service.clone() } else { service.id.clone() };
        if !id.is_empty() {
            entry.services.insert(
                id.clone(),
                NodeService {
                    id,
                    service: service.service.clone(),
                    tags: Some(service.tags.clone()),
                    port: service.port,
                    address: String::new(),
                },
            );
        }
        Ok(serde_json::Value::Bool(true))
    }

    async fn deregister_service(&self, deregistration: &CatalogDeregistration) -> Result<serde_json::Value, ConsulError> {
        self.record(MockCall::Deregister(deregistration.clone()))?;

        let mut nodes = self.nodes.lock().unwrap();
        match &deregistration.service_id {
            Some(service_id) => {
                if let Some(entry) = nodes.get_mut(&deregistration.node) {
                    entry.services.remove(service_id);
                }
            }
            None => {
                nodes.remove(&deregistration.node);
            }
        }
        Ok(serde_json::Value::Bool(true))
    }
}
