//! Tests for the chain node HTTP client against a mock node.

use docgraph_chain::{AbiEncoder, ChainError, ChainRpc, KeyType, TableReader, TableRowsRequest};
use docgraph_core::config::ChainConfig;
use docgraph_core::Edge;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HASH: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0";

fn rpc_for(server: &MockServer) -> ChainRpc {
    let config = ChainConfig {
        rpc_url: server.uri(),
        timeout_secs: 5,
        ..Default::default()
    };
    ChainRpc::new(&config).unwrap()
}

#[tokio::test]
async fn test_abi_json_to_bin_returns_binargs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/abi_json_to_bin"))
        .and(body_partial_json(json!({
            "code": "docs.hypha",
            "action": "newedge",
            "args": { "edge_name": "memberof" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "binargs": "deadbeef" })))
        .expect(1)
        .mount(&server)
        .await;

    let rpc = rpc_for(&server);
    let args = json!({ "from_node": HASH, "to_node": HASH, "edge_name": "memberof" });
    let bin = rpc
        .abi_json_to_bin(&"docs.hypha".into(), &"newedge".into(), &args)
        .await
        .unwrap();

    assert_eq!(bin, "deadbeef");
}

#[tokio::test]
async fn test_abi_json_to_bin_surfaces_node_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/abi_json_to_bin"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": 500,
            "message": "Internal Service Error",
            "error": {
                "code": 3015014,
                "name": "pack_exception",
                "what": "Pack data exception",
                "details": [{ "message": "Invalid checksum256 string" }]
            }
        })))
        .mount(&server)
        .await;

    let rpc = rpc_for(&server);
    let err = rpc
        .abi_json_to_bin(&"docs.hypha".into(), &"newedge".into(), &json!({}))
        .await
        .unwrap_err();

    match err {
        ChainError::Rpc { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Invalid checksum256 string");
        }
        other => panic!("expected Rpc error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_table_rows_sends_exact_index_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_table_rows"))
        .and(body_partial_json(json!({
            "code": "docs.hypha",
            "scope": "docs.hypha",
            "table": "edges",
            "index_position": "3",
            "key_type": "sha256",
            "lower_bound": HASH,
            "upper_bound": HASH,
            "limit": 1000,
            "json": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [{
                "id": 3,
                "from_node": HASH,
                "to_node": HASH,
                "edge_name": "owns",
                "created_date": "2020-08-15T00:00:00.000"
            }],
            "more": false,
            "next_key": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rpc = rpc_for(&server);
    let request = TableRowsRequest::new("docs.hypha", "docs.hypha", "edges")
        .index("3", KeyType::Sha256)
        .exact(HASH)
        .limit(1000);
    let rows = rpc.get_table_rows(&request).await.unwrap();
    let edges: Vec<Edge> = rows.decode().unwrap();

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].edge_name.as_str(), "owns");
}

#[tokio::test]
async fn test_get_table_rows_non_json_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_table_rows"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let rpc = rpc_for(&server);
    let request = TableRowsRequest::new("docs.hypha", "docs.hypha", "documents");
    let err = rpc.get_table_rows(&request).await.unwrap_err();

    assert!(matches!(err, ChainError::Rpc { status: 502, .. }));
}

#[tokio::test]
async fn test_get_table_rows_malformed_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chain/get_table_rows"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&server)
        .await;

    let rpc = rpc_for(&server);
    let request = TableRowsRequest::new("docs.hypha", "docs.hypha", "documents");
    let err = rpc.get_table_rows(&request).await.unwrap_err();

    assert!(matches!(err, ChainError::Decode(_)));
}
