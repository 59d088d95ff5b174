//! Consul Catalog API Client
//!
//! A Rust client library for the catalog endpoints of the Consul HTTP API.
//! Provides type-safe models and methods to list nodes and to register or
//! deregister nodes and their services.
//!
//! # Example
//!
//! ```no_run
//! use consul_client::{AgentService, CatalogRegistration, ConnectionConfig, ConsulClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ConsulClient::connect(ConnectionConfig {
//!     token: Some("your-acl-token".to_string()),
//!     ..Default::default()
//! })?;
//!
//! let nodes = client.list_nodes(None).await?;
//!
//! let registration = CatalogRegistration {
//!     node: "db1.example.net".to_string(),
//!     address: Some("db1.example.net".to_string()),
//!     service: AgentService {
//!         service: "postgres".to_string(),
//!         id: "db1_postgres".to_string(),
//!         tags: vec!["master".to_string()],
//!         port: 5432,
//!     },
//!     ..Default::default()
//! };
//! client.register_node(&registration).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod consul_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::ConsulClient;
pub use common::HttpClient;
pub use config::{ConnectionConfig, Scheme};
pub use error::ConsulError;
pub use models::*;
pub use consul_trait::ConsulClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockConsulClient};
