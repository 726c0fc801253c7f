use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use sealgate_errors::prelude::codes;
use sealgate_evaluator::prelude::*;
use sealgate_types::prelude::*;
use serde_json::{json, Value};

#[derive(Clone, Debug)]
struct Seen {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

type Log = Arc<Mutex<Vec<Seen>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn recording_engine(status: StatusCode, reply: &'static str) -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .fallback(
            move |State(log): State<Log>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes| async move {
                log.lock().unwrap().push(Seen {
                    method,
                    path: uri.path().to_string(),
                    headers,
                    body,
                });
                (status, reply)
            },
        )
        .with_state(log.clone());
    (serve(app).await, log)
}

fn payload() -> Value {
    json!({
        "endpoint": "Tag.List",
        "application": "atlas.tagging",
        "full_method": "/srv.Tag/List",
        "jwt": "a.b.c",
        "request_id": "req-1",
        "entitled_services": [],
        "type": "tag",
        "verb": "list",
        "ctx": null
    })
}

#[tokio::test]
async fn default_document_posts_bare_payload_to_root() {
    let (address, log) = recording_engine(StatusCode::OK, r#"{"allow":true}"#).await;
    let evaluator = RemoteEvaluator::builder(&address).build().unwrap();

    let response = evaluator
        .evaluate(&RequestScope::new(), "", &payload())
        .await
        .unwrap();
    assert_eq!(response.get("allow"), Some(&json!(true)));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/");
    assert_eq!(seen.headers.get("content-type").unwrap(), "application/json");
    let body: Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(body["endpoint"], "Tag.List");
    assert!(body.get("input").is_none());
}

#[tokio::test]
async fn named_document_keeps_envelope_and_path() {
    let (address, log) = recording_engine(
        StatusCode::OK,
        r#"{"result":{"allow":true,"obligations":[["x == 1"]]}}"#,
    )
    .await;
    let evaluator = RemoteEvaluator::builder(&address).build().unwrap();

    let input = json!({ "input": payload() });
    let response = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &input)
        .await
        .unwrap();
    assert!(response.contains_key("result"));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.path, "/v1/data/authz/rbac/validate_v1");
    let body: Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(body.as_object().unwrap().len(), 1);
    assert_eq!(body["input"]["full_method"], "/srv.Tag/List");
}

#[tokio::test]
async fn metadata_is_forwarded_as_headers() {
    let (address, log) = recording_engine(StatusCode::OK, "{}").await;
    let evaluator = RemoteEvaluator::builder(&address).build().unwrap();
    let metadata: Metadata = [
        ("x-request-id", "req-7"),
        ("trace-bin", "AAEC"),
        (":path", "/srv.Tag/List"),
    ]
    .into_iter()
    .collect();
    let scope = RequestScope::new().with_metadata(metadata);

    let response = evaluator.evaluate(&scope, "", &payload()).await.unwrap();
    assert!(response.is_empty());

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.headers.get("x-request-id").unwrap(), "req-7");
    assert!(seen.headers.get("trace-bin").is_none());
}

#[tokio::test]
async fn engine_error_object_is_mapped() {
    let (address, _log) = recording_engine(
        StatusCode::NOT_FOUND,
        r#"{"code":"undefined_document","message":"document missing"}"#,
    )
    .await;
    let evaluator = RemoteEvaluator::builder(&address).build().unwrap();
    let err = evaluator
        .evaluate(&RequestScope::new(), "v1/data/missing", &json!({"input": {}}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::EVALUATOR_NOT_FOUND);
    assert_eq!(err.0.message_dev.as_deref(), Some("document missing"));
}

#[tokio::test]
async fn undecodable_error_is_unknown_with_snippet() {
    let (address, _log) = recording_engine(StatusCode::BAD_GATEWAY, "upstream exploded").await;
    let evaluator = RemoteEvaluator::builder(&address).build().unwrap();
    let err = evaluator
        .evaluate(&RequestScope::new(), "", &payload())
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::UNKNOWN_INTERNAL);
    assert_eq!(err.0.meta.get("body"), Some(&json!("upstream exploded")));
    assert_eq!(err.0.meta.get("http_status"), Some(&json!(502)));
}

#[tokio::test]
async fn refused_connection_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let evaluator = RemoteEvaluator::builder(format!("http://{addr}"))
        .connect_timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let err = evaluator
        .evaluate(&RequestScope::new(), "", &payload())
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::EVALUATOR_UNAVAILABLE);
    assert!(err.0.is_retryable());
}

#[tokio::test]
async fn slow_engine_times_out_as_unavailable() {
    let app = Router::new().route(
        "/",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            "{}"
        }),
    );
    let address = serve(app).await;
    let evaluator = RemoteEvaluator::builder(&address)
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let err = evaluator
        .evaluate(&RequestScope::new(), "", &payload())
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::EVALUATOR_UNAVAILABLE);
}

#[tokio::test]
async fn health_and_policy_upload() {
    let uploads: Log = Arc::default();
    let app = Router::new()
        .route("/health", get(|| async { "{}" }))
        .route(
            "/v1/policies/:id",
            put(
                |State(log): State<Log>, uri: Uri, headers: HeaderMap, body: Bytes| async move {
                    log.lock().unwrap().push(Seen {
                        method: Method::PUT,
                        path: uri.path().to_string(),
                        headers,
                        body,
                    });
                    (StatusCode::OK, "{}").into_response()
                },
            ),
        )
        .with_state(uploads.clone());
    let address = serve(app).await;
    let evaluator = RemoteEvaluator::builder(&address).build().unwrap();

    evaluator.health().await.unwrap();
    evaluator
        .upload_rego_policy("authz", "package authz\nallow := true\n")
        .await
        .unwrap();

    let seen = uploads.lock().unwrap()[0].clone();
    assert_eq!(seen.path, "/v1/policies/authz");
    assert_eq!(seen.headers.get("content-type").unwrap(), "text/plain");
    assert_eq!(&seen.body[..], b"package authz\nallow := true\n");
}

#[tokio::test]
async fn builder_validates_address() {
    assert!(RemoteEvaluator::builder("ftp://engine").build().is_err());
    assert!(RemoteEvaluator::builder("not a url").build().is_err());

    let evaluator = RemoteEvaluator::builder("http://engine:8181/").build().unwrap();
    assert_eq!(evaluator.address(), "http://engine:8181");
    assert_eq!(evaluator.url_for(""), "http://engine:8181/");

    let defaulted = RemoteEvaluator::builder("").build().unwrap();
    assert_eq!(defaulted.address(), paths::DEFAULT_ADDRESS);
}

#[tokio::test]
async fn remote_config_builds_client() {
    let config = RemoteConfig {
        address: "http://127.0.0.1:9".into(),
        timeout_ms: 250,
        connect_timeout_ms: 100,
        user_agent: Some("sealgate-test".into()),
    };
    let evaluator = config.build().unwrap();
    assert_eq!(evaluator.address(), "http://127.0.0.1:9");
}
