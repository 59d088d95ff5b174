//! Comparison of a catalog node against the requested registration

use crate::target::CatalogTarget;
use consul_client::CatalogNodeServices;

/// True when registering `target` would leave `existing` unchanged
pub(super) fn registration_matches(existing: &CatalogNodeServices, target: &CatalogTarget) -> bool {
    if existing.node.address != target.node.address.as_deref().unwrap_or_default() {
        return false;
    }

    let service = &target.service;
    // Consul stores a service without an ID under its name
    let id = if service.id.is_empty() { &service.name } else { &service.id };

    existing.services.get(id).is_some_and(|current| {
        current.service == service.name
            && current.port == service.port
            && current.tags.as_deref().unwrap_or_default() == service.tags.as_slice()
    })
}
