//! Reconciliation logic for a single catalog entry.
//!
//! One call to [`Reconciler::reconcile`] makes at most two catalog requests:
//! - `present`: a single register (Consul upserts, so this is always safe)
//! - `absent`: a node listing, then a deregister only if the node is listed

mod diff;

use crate::error::ControllerError;
use crate::target::{CatalogTarget, DesiredState};
use consul_client::ConsulClientTrait;
use tracing::{debug, info};

/// How the `present` path decides whether something changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangeDetection {
    /// Register unconditionally and always report a change
    #[default]
    Always,
    /// Read the node first and skip registration when it already matches
    Diff,
}

/// Outcome reported back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationResult {
    pub changed: bool,
    /// Raw Consul response, or an empty string when no write was made
    pub meta: serde_json::Value,
}

impl ReconciliationResult {
    fn changed(response: serde_json::Value) -> Self {
        Self {
            changed: true,
            meta: response,
        }
    }

    fn unchanged() -> Self {
        Self {
            changed: false,
            meta: serde_json::Value::String(String::new()),
        }
    }
}

/// Reconciles one node/service against the Consul catalog.
pub struct Reconciler {
    consul_client: Box<dyn ConsulClientTrait + Send + Sync>,
    datacenter: Option<String>,
    change_detection: ChangeDetection,
}

impl Reconciler {
    pub fn new(
        consul_client: impl ConsulClientTrait + Send + Sync + 'static,
        datacenter: Option<String>,
    ) -> Self {
        Self {
            consul_client: Box::new(consul_client),
            datacenter: datacenter.filter(|dc| !dc.is_empty()),
            change_detection: ChangeDetection::default(),
        }
    }

    #[must_use]
    pub fn with_change_detection(mut self, change_detection: ChangeDetection) -> Self {
        self.change_detection = change_detection;
        self
    }

    fn datacenter(&self) -> Option<&str> {
        self.datacenter.as_deref()
    }

    /// Bring the catalog in line with `state` for `target`
    ///
    /// # Errors
    /// Any failed catalog call is returned as `ControllerError::Consul`.
    /// Nothing is retried or rolled back.
    pub async fn reconcile(
        &self,
        target: &CatalogTarget,
        state: DesiredState,
    ) -> Result<ReconciliationResult, ControllerError> {
        info!(
            "Reconciling node {} (service {:?}) to state {} via {}",
            target.node.node,
            target.service.id,
            state,
            self.consul_client.base_url()
        );

        match state {
            DesiredState::Present => self.ensure_present(target).await,
            DesiredState::Absent => self.ensure_absent(target).await,
        }
    }

    async fn ensure_present(&self, target: &CatalogTarget) -> Result<ReconciliationResult, ControllerError> {
        if self.change_detection == ChangeDetection::Diff {
            let existing = self
                .consul_client
                .get_node(&target.node.node, self.datacenter())
                .await?;
            if existing.is_some_and(|node| diff::registration_matches(&node, target)) {
                info!("Node {} already registered as requested, nothing to do", target.node.node);
                return Ok(ReconciliationResult::unchanged());
            }
        }

        let registration = target.registration(self.datacenter());
        let response = self.consul_client.register_node(&registration).await?;
        info!("Registered node {} in the catalog", target.node.node);
        Ok(ReconciliationResult::changed(response))
    }

    async fn ensure_absent(&self, target: &CatalogTarget) -> Result<ReconciliationResult, ControllerError> {
        if !self.node_exists(&target.node.node).await? {
            debug!("Node {} not in the catalog, nothing to deregister", target.node.node);
            return Ok(ReconciliationResult::unchanged());
        }

        let deregistration = target.deregistration(self.datacenter());
        let response = self.consul_client.deregister_service(&deregistration).await?;
        info!(
            "Deregistered service {:?} from node {}",
            target.service.id, target.node.node
        );
        Ok(ReconciliationResult::changed(response))
    }

    /// Whether a node with exactly this name is listed in the datacenter
    pub async fn node_exists(&self, node: &str) -> Result<bool, ControllerError> {
        let nodes = self.consul_client.list_nodes(self.datacenter()).await?;
        Ok(nodes.iter().any(|n| n.node == node))
    }
}
