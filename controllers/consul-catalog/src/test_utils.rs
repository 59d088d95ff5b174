//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::reconciler::Reconciler;
use crate::target::{CatalogTarget, NodeSpec, ServiceSpec};
use consul_client::MockConsulClient;

/// The db1/postgres entry used throughout the tests
pub fn postgres_target() -> CatalogTarget {
    CatalogTarget {
        node: NodeSpec {
            node: "db1.example.net".to_string(),
            address: Some("db1.example.net".to_string()),
        },
        service: ServiceSpec {
            name: "postgres".to_string(),
            id: "db1_postgres".to_string(),
            port: 5432,
            tags: vec!["master".to_string(), "v1".to_string()],
        },
    }
}

/// Mock client with an empty catalog
pub fn create_mock_client() -> MockConsulClient {
    MockConsulClient::new("http://test-consul:8500")
}

/// Reconciler backed by a clone of `mock`, so the test keeps a handle for assertions
pub fn create_test_reconciler(mock: &MockConsulClient, datacenter: Option<&str>) -> Reconciler {
    Reconciler::new(mock.clone(), datacenter.map(str::to_string))
}
