//! Wire-level tests for the wallet daemon client

use omni_gateway::{ClientConfig, GatewayError, WalletClient};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> WalletClient {
    WalletClient::new(ClientConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn test_request_headers_and_envelope() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/json;charset=utf-8"))
        .and(header("accept", "application/json"))
        .and(body_partial_json(json!({
            "jsonrpc": "1.0",
            "method": "omni_gettransaction",
            "params": ["abc"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": {"txid": "abc"}, "id": 5})),
        )
        .expect(1)
        .mount(&daemon)
        .await;

    let result = client_for(&daemon).call("omni_gettransaction", vec![json!("abc")]).await.unwrap();
    assert_eq!(result, json!({"txid": "abc"}));
}

#[tokio::test]
async fn test_single_composite_param_is_sent_unwrapped() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"params": {"verbose": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .expect(1)
        .mount(&daemon)
        .await;

    let result = client_for(&daemon).call("anything", vec![json!({"verbose": true})]).await.unwrap();
    assert_eq!(result, json!(true));
}

#[tokio::test]
async fn test_rpc_error_with_http_500() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "result": null,
            "error": {"code": -32601, "message": "Method not found"},
            "id": 1
        })))
        .mount(&daemon)
        .await;

    let err = client_for(&daemon).call("omni_nothing", vec![]).await.unwrap_err();
    match err {
        GatewayError::Rpc { code, message } => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_status() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Loading block index..."))
        .mount(&daemon)
        .await;

    let err = client_for(&daemon).call("getnewaddress", vec![]).await.unwrap_err();
    match err {
        GatewayError::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "Loading block index...");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_json_error_status_without_rpc_error() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"status": "warming up"})))
        .mount(&daemon)
        .await;

    let client = client_for(&daemon);
    let err = client.call("getnewaddress", vec![]).await.unwrap_err();
    match err {
        GatewayError::HttpStatus { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("warming up"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.call_as::<String>("getnewaddress", vec![]).await.unwrap_err();
    assert!(matches!(err, GatewayError::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_json_unauthorized_without_rpc_error() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"result": null})))
        .mount(&daemon)
        .await;

    let err = client_for(&daemon).call("getnewaddress", vec![]).await.unwrap_err();
    assert!(matches!(err, GatewayError::AuthFailed { .. }));
}

#[tokio::test]
async fn test_non_json_success_is_decode_error() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&daemon)
        .await;

    let err = client_for(&daemon).call("getnewaddress", vec![]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Json(_)));
}

#[tokio::test]
async fn test_unauthorized() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST")).respond_with(ResponseTemplate::new(401)).mount(&daemon).await;

    let client = WalletClient::new(ClientConfig::new(daemon.uri()).credentials("u", "bad")).unwrap();
    let err = client.call("getnewaddress", vec![]).await.unwrap_err();
    assert!(matches!(err, GatewayError::AuthFailed { .. }));
}

#[tokio::test]
async fn test_call_as_type_mismatch() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": 12})))
        .mount(&daemon)
        .await;

    let err = client_for(&daemon).call_as::<Vec<String>>("getaddressesbyaccount", vec![json!("")]).await;
    assert!(matches!(err, Err(GatewayError::Json(_))));
}

#[tokio::test]
async fn test_unreachable_daemon() {
    // Nothing listens on port 1
    let client = WalletClient::new(
        ClientConfig::new("http://127.0.0.1:1").timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let err = client.call("getnewaddress", vec![]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Http(_)));
}

#[tokio::test]
async fn test_result_defaults_to_null() {
    let daemon = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "error": null})))
        .mount(&daemon)
        .await;

    let result: Value = client_for(&daemon).call("omni_send", vec![]).await.unwrap();
    assert!(result.is_null());
}
