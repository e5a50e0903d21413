//! Integration tests for the inferhook handlers and runtime.

use inferhook::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

/// Backend double that records payloads and answers with a fixed response.
struct RecordingBackend {
    calls: AtomicUsize,
    payloads: std::sync::Mutex<Vec<String>>,
    status: u16,
    content: &'static str,
}

impl RecordingBackend {
    fn new(status: u16, content: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            payloads: std::sync::Mutex::new(Vec::new()),
            status,
            content,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_payload(&self) -> Option<String> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn predict(
        &self,
        payload: String,
        _ctx: &HandlerContext,
    ) -> Result<BackendResponse, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload);
        Ok(BackendResponse::new(self.status, self.content).with_content_type("application/json"))
    }
}

async fn checked_pipeline(backend: Arc<RecordingBackend>) -> Pipeline {
    let store = MemoryFeatureStore::new();
    store
        .put_record(
            "transactions",
            "r1",
            Record::default().with_feature("payload", r#"{"amount": 12.5, "items": [1, 2]}"#),
        )
        .await;
    let check = FeatureConsistencyCheck::new(Arc::new(store), "transactions");
    Pipeline::new(Arc::new(FeatureCheckedHandler::new(check)), backend)
}

#[test]
fn test_json_input_is_identity() {
    for body in [r#"{"instances": [1, 2]}"#, "[1,2,3]", "{broken"] {
        let out = assert_ok!(transform_input(body.as_bytes(), Some("application/json")));
        assert_eq!(out, body);
    }
    assert_eq!(assert_ok!(transform_input(b"", Some("application/json"))), "");
}

#[test]
fn test_csv_input_example() {
    let out = assert_ok!(transform_input(b"1.0,2.5,3.0", Some("text/csv")));
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value, json!({ "instances": [1.0, 2.5, 3.0] }));

    let err = assert_err!(transform_input(b"not,a,number", Some("text/csv")));
    assert!(matches!(err, HandlerError::Parse(_)));
}

#[test]
fn test_unsupported_content_type_embeds_type() {
    for content_type in ["text/plain", "application/x-npy", "image/png"] {
        let err = assert_err!(transform_input(b"x", Some(content_type)));
        assert!(matches!(err, HandlerError::UnsupportedContentType { .. }));
        assert!(err.to_string().contains(content_type));
    }
}

#[test]
fn test_output_contract() {
    let err = assert_err!(transform_output(
        BackendResponse::new(500, r#"{"error":"oom"}"#),
        "application/json"
    ));
    assert_eq!(err.to_string(), r#"{"error":"oom"}"#);

    let out = assert_ok!(transform_output(
        BackendResponse::new(200, "0.1,0.9"),
        "text/csv"
    ));
    assert_eq!(&out.content[..], b"0.1,0.9");
    assert_eq!(out.content_type, "text/csv");
}

#[tokio::test]
async fn test_pipeline_csv_round() {
    let backend = RecordingBackend::new(200, r#"{"predictions": [3.5]}"#);
    let pipeline = Pipeline::new(Arc::new(PassThroughHandler::new()), backend.clone());

    let request = InvocationRequest::new()
        .header("Content-Type", "text/csv")
        .header("Accept", "application/json")
        .body("1,2,3");
    let response = pipeline.invoke(request, "req-1").await;

    assert_eq!(response.status, hyper::StatusCode::OK);
    assert_eq!(response.text_body(), r#"{"predictions": [3.5]}"#);
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(backend.calls(), 1);
    let payload: Value = serde_json::from_str(&backend.last_payload().unwrap()).unwrap();
    assert_eq!(payload, json!({ "instances": [1.0, 2.0, 3.0] }));
}

#[tokio::test]
async fn test_pipeline_rejects_before_backend() {
    let backend = RecordingBackend::new(200, "{}");
    let pipeline = Pipeline::new(Arc::new(PassThroughHandler::new()), backend.clone());

    let request = InvocationRequest::new()
        .header("Content-Type", "text/plain")
        .body("hello");
    let response = pipeline.invoke(request, "req-2").await;

    assert_eq!(response.status, hyper::StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = response.json_body().unwrap();
    assert_eq!(body["error"], "unsupported content type text/plain");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_pipeline_backend_error_is_surfaced() {
    let backend = RecordingBackend::new(500, r#"{"error":"oom"}"#);
    let pipeline = Pipeline::new(Arc::new(PassThroughHandler::new()), backend.clone());

    let request = InvocationRequest::new()
        .header("Content-Type", "application/json")
        .body(r#"{"instances": [[1]]}"#);
    let err = assert_err!(pipeline.run(request.clone(), "req-3").await);
    assert_eq!(
        err,
        HandlerError::Backend {
            status: 500,
            message: r#"{"error":"oom"}"#.to_string(),
            content_type: Some("application/json".to_string()),
        }
    );

    let response = pipeline.invoke(request, "req-4").await;
    assert_eq!(response.status, hyper::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text_body(), r#"{"error":"oom"}"#);
}

#[tokio::test]
async fn test_feature_checked_pipeline_forwards_inputs() {
    let backend = RecordingBackend::new(200, r#"{"outputs": [0.7]}"#);
    let pipeline = checked_pipeline(backend.clone()).await;

    let request = InvocationRequest::new()
        .header("Content-Type", "application/json")
        .body(r#"{"data": {"items": [1.0, 2.0], "amount": 12.5}, "id": "r1"}"#);
    let response = assert_ok!(pipeline.run(request, "req-5").await);

    assert_eq!(&response.content[..], br#"{"outputs": [0.7]}"#);
    let payload: Value = serde_json::from_str(&backend.last_payload().unwrap()).unwrap();
    assert_eq!(
        payload,
        json!({ "inputs": { "items": [1.0, 2.0], "amount": 12.5 } })
    );
}

#[tokio::test]
async fn test_feature_mismatch_never_reaches_backend() {
    let backend = RecordingBackend::new(200, "{}");
    let pipeline = checked_pipeline(backend.clone()).await;

    let request = InvocationRequest::new()
        .header("Content-Type", "application/json")
        .body(r#"{"data": {"amount": 99, "items": [1, 2]}, "id": "r1"}"#);
    let response = pipeline.invoke(request, "req-6").await;

    assert_eq!(response.status, hyper::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_feature_missing_record_never_reaches_backend() {
    let backend = RecordingBackend::new(200, "{}");
    let pipeline = checked_pipeline(backend.clone()).await;

    let request = InvocationRequest::new()
        .header("Content-Type", "application/json")
        .body(r#"{"data": 1, "id": "unknown"}"#);
    let err = assert_err!(pipeline.run(request, "req-7").await);

    assert!(matches!(err, HandlerError::Consistency(_)));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_server_end_to_end() {
    let mut tfs = mockito::Server::new_async().await;
    let predict = tfs
        .mock("POST", "/v1/models/half_plus_three:predict")
        .match_body(mockito::Matcher::Json(json!({ "instances": [1.0, 2.0] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"predictions": [3.5, 4.0]}"#)
        .create_async()
        .await;

    let config = ServerConfig::new()
        .host("127.0.0.1")
        .backend(tfs.url(), "half_plus_three");
    let server = InferenceServer::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    let client = reqwest::Client::new();

    let ping = client
        .get(format!("http://{}/ping", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(ping.status(), reqwest::StatusCode::OK);

    let response = client
        .post(format!("http://{}/invocations", addr))
        .header("Content-Type", "text/csv")
        .header("Accept", "application/json")
        .body("1,2")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#"{"predictions": [3.5, 4.0]}"#);
    predict.assert_async().await;

    let missing = client
        .get(format!("http://{}/nowhere", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let wrong_method = client
        .get(format!("http://{}/invocations", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_method.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    let wrong_method = client
        .post(format!("http://{}/ping", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_method.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_server_compares_configured_feature() {
    let mut feature_store = mockito::Server::new_async().await;
    feature_store
        .mock("GET", "/FeatureGroup/transactions")
        .match_query(mockito::Matcher::UrlEncoded(
            "RecordIdentifierValueAsString".into(),
            "r1".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "Record": [
                    { "FeatureName": "record_id", "ValueAsString": "\"r1\"" },
                    { "FeatureName": "payload", "ValueAsString": "[0.5, 1.5]" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut tfs = mockito::Server::new_async().await;
    let predict = tfs
        .mock("POST", "/v1/models/model:predict")
        .match_body(mockito::Matcher::Json(json!({ "inputs": [0.5, 1.5] })))
        .with_status(200)
        .with_body(r#"{"outputs": [1]}"#)
        .create_async()
        .await;

    // The first feature is the record id, so only the named feature can match.
    let config = ServerConfig {
        feature_store_url: feature_store.url(),
        feature_name: Some("payload".to_string()),
        ..ServerConfig::new()
            .host("127.0.0.1")
            .backend(tfs.url(), "model")
            .feature_group("transactions")
    };
    let server = InferenceServer::from_config(config).unwrap();
    assert_eq!(server.pipeline().handler_name(), "feature-checked");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    let response = reqwest::Client::new()
        .post(format!("http://{}/invocations", addr))
        .header("Content-Type", "application/json")
        .body(r#"{"data": [0.5, 1.5], "id": "r1"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), r#"{"outputs": [1]}"#);
    predict.assert_async().await;
}

#[tokio::test]
async fn test_server_rejects_oversized_body() {
    let config = ServerConfig {
        max_body_size: 4,
        ..ServerConfig::new().host("127.0.0.1")
    };
    let server = InferenceServer::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    let response = reqwest::Client::new()
        .post(format!("http://{}/invocations", addr))
        .header("Content-Type", "text/csv")
        .body("1,2,3,4,5")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
}
