//! HTTP-level tests for the Consul client against a mock agent

use consul_client::{
    AgentService, CatalogDeregistration, CatalogRegistration, ConnectionConfig, ConsulClient, ConsulError,
};
use httpmock::prelude::*;
use serde_json::json;

fn client_for(server: &MockServer, token: Option<&str>, datacenter: Option<&str>) -> ConsulClient {
    ConsulClient::connect(ConnectionConfig {
        host: server.host(),
        port: server.port(),
        token: token.map(str::to_string),
        datacenter: datacenter.map(str::to_string),
        ..Default::default()
    })
    .expect("Failed to create client")
}

fn postgres_registration() -> CatalogRegistration {
    CatalogRegistration {
        datacenter: None,
        node: "db1.example.net".to_string(),
        address: Some("db1.example.net".to_string()),
        service: AgentService {
            service: "postgres".to_string(),
            id: "db1_postgres".to_string(),
            tags: vec!["master".to_string(), "v1".to_string()],
            port: 5432,
        },
    }
}

#[tokio::test]
async fn test_list_nodes_sends_token_and_datacenter() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/catalog/nodes")
                .query_param("dc", "dc1")
                .header("X-Consul-Token", "notcheese");
            then.status(200).json_body(json!([
                { "ID": "a", "Node": "app1", "Address": "10.0.0.1", "Datacenter": "dc1" },
                { "ID": "b", "Node": "db1.example.net", "Address": "10.0.0.2", "Datacenter": "dc1" }
            ]));
        })
        .await;

    let client = client_for(&server, Some("notcheese"), Some("dc1"));
    let nodes = client.list_nodes(None).await.expect("Failed to list nodes");

    mock.assert_async().await;
    let names: Vec<&str> = nodes.iter().map(|n| n.node.as_str()).collect();
    assert_eq!(names, vec!["app1", "db1.example.net"]);
}

#[tokio::test]
async fn test_register_node_sends_upsert_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/catalog/register").json_body(json!({
                "Node": "db1.example.net",
                "Address": "db1.example.net",
                "Service": {
                    "Service": "postgres",
                    "ID": "db1_postgres",
                    "Tags": ["master", "v1"],
                    "Port": 5432
                }
            }));
            then.status(200).json_body(json!(true));
        })
        .await;

    let client = client_for(&server, None, None);
    let response = client
        .register_node(&postgres_registration())
        .await
        .expect("Failed to register node");

    mock.assert_async().await;
    assert_eq!(response, json!(true));
}

#[tokio::test]
async fn test_register_node_uses_connection_datacenter() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/catalog/register").json_body(json!({
                "Datacenter": "east",
                "Node": "db1.example.net",
                "Address": "db1.example.net",
                "Service": {
                    "Service": "postgres",
                    "ID": "db1_postgres",
                    "Tags": ["master", "v1"],
                    "Port": 5432
                }
            }));
            then.status(200).json_body(json!(true));
        })
        .await;

    let client = client_for(&server, None, Some("east"));
    client
        .register_node(&postgres_registration())
        .await
        .expect("Failed to register node");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_deregister_service_sends_service_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/catalog/deregister").json_body(json!({
                "Node": "db1.example.net",
                "ServiceID": "db1_postgres"
            }));
            then.status(200).json_body(json!(true));
        })
        .await;

    let client = client_for(&server, None, None);
    let response = client
        .deregister_service(&CatalogDeregistration {
            datacenter: None,
            node: "db1.example.net".to_string(),
            service_id: Some("db1_postgres".to_string()),
        })
        .await
        .expect("Failed to deregister service");

    mock.assert_async().await;
    assert_eq!(response, json!(true));
}

#[tokio::test]
async fn test_get_node_unknown_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/catalog/node/ghost");
            then.status(200).body("null");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/catalog/node/gone");
            then.status(404);
        })
        .await;

    let client = client_for(&server, None, None);
    assert!(client.get_node("ghost", None).await.unwrap().is_none());
    assert!(client.get_node("gone", None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_node_with_services() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/catalog/node/db1.example.net");
            then.status(200).json_body(json!({
                "Node": { "Node": "db1.example.net", "Address": "db1.example.net" },
                "Services": {
                    "db1_postgres": {
                        "ID": "db1_postgres",
                        "Service": "postgres",
                        "Tags": ["master", "v1"],
                        "Port": 5432
                    }
                }
            }));
        })
        .await;

    let client = client_for(&server, None, None);
    let node = client
        .get_node("db1.example.net", None)
        .await
        .unwrap()
        .expect("node should exist");
    assert_eq!(node.services["db1_postgres"].service, "postgres");
}

#[tokio::test]
async fn test_api_error_carries_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/catalog/register");
            then.status(403).body("Permission denied");
        })
        .await;

    let client = client_for(&server, Some("wrong"), None);
    let err = client
        .register_node(&postgres_registration())
        .await
        .expect_err("register should fail");

    match err {
        ConsulError::Api { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "Permission denied");
        }
        other => panic!("Expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_body_is_serialization_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/catalog/nodes");
            then.status(200).body("<html>proxy error</html>");
        })
        .await;

    let client = client_for(&server, None, None);
    let err = client.list_nodes(None).await.expect_err("list should fail");
    assert!(matches!(err, ConsulError::Serialization(_)));
}

#[tokio::test]
#[ignore] // Requires running Consul agent
async fn test_live_list_nodes() {
    let host = std::env::var("CONSUL_HOST").unwrap_or_else(|_| "localhost".to_string());
    let client = ConsulClient::connect(ConnectionConfig {
        host,
        token: std::env::var("CONSUL_HTTP_TOKEN").ok(),
        ..Default::default()
    })
    .expect("Failed to create client");

    let nodes = client.list_nodes(None).await.expect("Failed to list nodes");
    println!("Found {} nodes", nodes.len());
}
