//! HTTP-level tests for the vision client, remote background removal and the
//! segmentation model download, using real reqwest clients against a local
//! mock server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wardrobe_core::background::{download_model, RemoteRemover, RemoveBgClient};
use wardrobe_core::llm::HttpTransport;
use wardrobe_core::{
    AnalyzeError, BackgroundError, Capability, EndpointSelector, EndpointStore, MemoryEndpointStore, NewEndpoint,
    VisionClient, VisionOptions,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_endpoint(base: String) -> NewEndpoint {
    NewEndpoint {
        capability: Capability::Llm,
        api_base: base,
        api_key: "sk-integration".to_string(),
        model: Some("qwen-vl-plus".to_string()),
    }
}

fn client(store: Arc<MemoryEndpointStore>) -> VisionClient {
    VisionClient::new(
        EndpointSelector::new(store),
        Arc::new(HttpTransport::new()),
        VisionOptions {
            retry_delay_ms: 0,
            timeout_ms: 5_000,
            ..VisionOptions::default()
        },
    )
}

fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn test_vision_request_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-integration"))
        .and(body_partial_json(json!({"model": "qwen-vl-plus", "max_tokens": 1000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("{\"item\": \"衬衫\"}")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryEndpointStore::new());
    let id = store.insert(llm_endpoint(format!("{}/", server.uri())));

    let reply = client(store.clone())
        .analyze(&[0x89, 0x50, 0x4E, 0x47], "classify")
        .await
        .unwrap();
    assert_eq!(reply.as_str(), "{\"item\": \"衬衫\"}");
    assert_eq!(store.usage_of(id), Some(1));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let content = &body["messages"][0]["content"];
    assert_eq!(content[0]["text"], "classify");
    assert!(content[1]["image_url"]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/"));
}

#[tokio::test]
async fn test_vision_retries_server_errors_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("third time")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryEndpointStore::new());
    let id = store.insert(llm_endpoint(server.uri()));

    let reply = client(store.clone()).analyze(&[1, 2, 3], "p").await.unwrap();
    assert_eq!(reply.as_str(), "third time");
    assert_eq!(store.usage_of(id), Some(1));
}

#[tokio::test]
async fn test_vision_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(3)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryEndpointStore::new());
    let id = store.insert(llm_endpoint(server.uri()));

    let err = client(store.clone()).analyze(&[1], "p").await.unwrap_err();
    assert!(matches!(err, AnalyzeError::ExhaustedRetries { attempts: 3, .. }));
    assert!(err.to_string().contains("internal error"));
    assert_eq!(store.usage_of(id), Some(0));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_failure() {
    // Bind and release a port so nothing is listening on it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let uri = format!("http://127.0.0.1:{port}");
    let store = Arc::new(MemoryEndpointStore::new());
    store.insert(llm_endpoint(uri));

    let err = client(store).analyze(&[1], "p").await.unwrap_err();
    match err {
        AnalyzeError::ExhaustedRetries { last, .. } => {
            assert!(matches!(*last, AnalyzeError::TransportFailure { .. }));
        }
        other => panic!("Expected ExhaustedRetries, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_models_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{"id": "qwen-vl-plus"}, {"id": "qwen-vl-max", "name": "Qwen VL Max"}]
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryEndpointStore::new());
    store.insert(llm_endpoint(format!("{}/v1", server.uri())));

    let models = client(store).list_models().await.unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["qwen-vl-plus", "Qwen VL Max"]);
}

#[tokio::test]
async fn test_remove_bg_client_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/removebg"))
        .and(header("X-Api-Key", "rb-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"processed-png".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryEndpointStore::new());
    store.insert(NewEndpoint {
        capability: Capability::RemoveBg,
        api_base: format!("{}/v1.0/removebg", server.uri()),
        api_key: "rb-key".to_string(),
        model: None,
    });
    let endpoint = store
        .list_active(Capability::RemoveBg)
        .await
        .unwrap()
        .remove(0);

    let remover = RemoveBgClient::new(Duration::from_secs(5));
    let out = remover.remove(&endpoint, b"raw-image").await.unwrap();
    assert_eq!(out, b"processed-png");

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"image_file\""));
    assert!(body.contains("name=\"size\""));
    assert!(body.contains("auto"));
}

#[tokio::test]
async fn test_remove_bg_client_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_string("insufficient credits"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryEndpointStore::new());
    store.insert(NewEndpoint {
        capability: Capability::RemoveBg,
        api_base: server.uri(),
        api_key: "rb-key".to_string(),
        model: None,
    });
    let endpoint = store
        .list_active(Capability::RemoveBg)
        .await
        .unwrap()
        .remove(0);

    let err = RemoveBgClient::new(Duration::from_secs(5))
        .remove(&endpoint, b"raw-image")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("402"));
}

#[tokio::test]
async fn test_download_model_writes_verified_file() {
    let weights: Vec<u8> = (0..4096u32).map(|i| (i % 256) as u8).collect();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/u2net.onnx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(weights.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("u2net").join("u2net.onnx");
    let expected = blake3::hash(&weights).to_hex().to_string();

    let digest = download_model(
        &reqwest::Client::new(),
        &format!("{}/u2net.onnx", server.uri()),
        &dest,
        Some(&expected),
    )
    .await
    .unwrap();

    assert_eq!(digest, expected);
    assert_eq!(std::fs::read(&dest).unwrap(), weights);
    assert!(!dir.path().join("u2net").join("u2net.onnx.part").exists());
}

#[tokio::test]
async fn test_download_model_rejects_checksum_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"corrupted".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("u2net.onnx");
    let pinned = blake3::hash(b"the real weights").to_hex().to_string();

    let err = download_model(
        &reqwest::Client::new(),
        &format!("{}/u2net.onnx", server.uri()),
        &dest,
        Some(&pinned),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BackgroundError::ChecksumMismatch { .. }));
    assert!(!dest.exists());
    assert!(!dir.path().join("u2net.onnx.part").exists());
}

#[tokio::test]
async fn test_download_model_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("u2net.onnx");

    let err = download_model(
        &reqwest::Client::new(),
        &format!("{}/u2net.onnx", server.uri()),
        &dest,
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BackgroundError::Download(_)));
    assert!(err.to_string().contains("404"));
    assert!(!dest.exists());
}
