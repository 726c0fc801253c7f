use std::fs;
use std::path::Path;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use sealgate_errors::prelude::codes;
use sealgate_evaluator::prelude::*;
use sealgate_types::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const POLICY_V1: &str = r#"
package authz.rbac

import rego.v1

default validate_v1 := {"allow": false}

validate_v1 := {"allow": true, "obligations": [["tenant = 't1'"]]} if {
    input.verb in data.roles.viewer
}

never := {"allow": true} if {
    input.verb == "never-sent"
}

flag := true
"#;

const POLICY_V2: &str = r#"
package authz.rbac

import rego.v1

validate_v1 := {"allow": false, "reason": "frozen"}
"#;

fn write_bundle(dir: &Path, policy: &str) {
    fs::create_dir_all(dir.join("authz")).unwrap();
    fs::create_dir_all(dir.join("roles")).unwrap();
    fs::write(dir.join("authz").join("rbac.rego"), policy).unwrap();
    fs::write(dir.join("roles").join("data.json"), r#"{"viewer": ["list", "get"]}"#).unwrap();
    fs::write(dir.join(".manifest"), r#"{"revision": "1"}"#).unwrap();
}

fn config_for(dir: &Path) -> EmbeddedConfig {
    EmbeddedConfig::default()
        .with_bundle_url(format!("file://{}", dir.display()))
        .with_reload_interval(Duration::ZERO)
}

fn wrapped(verb: &str) -> Value {
    json!({"input": {"endpoint": "Tag.List", "verb": verb}})
}

#[tokio::test]
async fn directory_bundle_answers_named_documents() {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), POLICY_V1);
    let evaluator = EmbeddedEvaluator::start(config_for(dir.path())).await.unwrap();

    let allowed = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap();
    assert_eq!(allowed.get("allow"), Some(&json!(true)));
    assert_eq!(allowed.get("obligations"), Some(&json!([["tenant = 't1'"]])));
    assert!(allowed.get("result").is_none());

    let denied = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("delete"))
        .await
        .unwrap();
    assert_eq!(denied.get("allow"), Some(&json!(false)));
    evaluator.shutdown().await;
}

#[tokio::test]
async fn empty_document_uses_configured_decision_path() {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), POLICY_V1);
    let evaluator = EmbeddedEvaluator::start(config_for(dir.path())).await.unwrap();

    let bare = json!({"endpoint": "Tag.List", "verb": "get"});
    let response = evaluator
        .evaluate(&RequestScope::new(), "", &bare)
        .await
        .unwrap();
    assert_eq!(response.get("allow"), Some(&json!(true)));
}

#[tokio::test]
async fn undefined_and_non_object_decisions_fail() {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), POLICY_V1);
    let evaluator = EmbeddedEvaluator::start(config_for(dir.path())).await.unwrap();

    let err = evaluator
        .evaluate(&RequestScope::new(), "v1/data/authz/rbac/never", &wrapped("list"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::EVALUATOR_NOT_FOUND);

    let err = evaluator
        .evaluate(&RequestScope::new(), "v1/data/authz/rbac/flag", &wrapped("list"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::UNKNOWN_INTERNAL);
}

#[tokio::test]
async fn cancelled_scope_short_circuits() {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), POLICY_V1);
    let evaluator = EmbeddedEvaluator::start(config_for(dir.path())).await.unwrap();

    let scope = RequestScope::new();
    scope.cancellation().cancel();
    let err = evaluator
        .evaluate(&scope, paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::REQUEST_CANCELLED);
}

#[tokio::test]
async fn reconfigure_switches_bundles() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_bundle(first.path(), POLICY_V1);
    write_bundle(second.path(), POLICY_V2);

    let evaluator = EmbeddedEvaluator::start(config_for(first.path())).await.unwrap();
    let before = evaluator.revision();
    let mut status = evaluator.subscribe();

    evaluator.reconfigure(config_for(second.path())).await.unwrap();
    assert!(evaluator.revision() > before);
    assert!(status.has_changed().unwrap());
    assert_eq!(status.borrow_and_update().error, None);

    let response = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap();
    assert_eq!(response.get("allow"), Some(&json!(false)));
    assert_eq!(response.get("reason"), Some(&json!("frozen")));
    assert!(evaluator.config().bundle_url.contains(&second.path().display().to_string()));
}

#[tokio::test]
async fn invalid_reconfiguration_keeps_previous_bundle() {
    let good = TempDir::new().unwrap();
    let broken = TempDir::new().unwrap();
    write_bundle(good.path(), POLICY_V1);
    write_bundle(broken.path(), "package authz.rbac\nvalidate_v1 := {");

    let evaluator = EmbeddedEvaluator::start(config_for(good.path())).await.unwrap();
    let err = evaluator
        .reconfigure(config_for(broken.path()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::EVALUATOR_INVALID_ARGUMENT);
    assert!(evaluator.config().bundle_url.contains(&good.path().display().to_string()));

    let response = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap();
    assert_eq!(response.get("allow"), Some(&json!(true)));
}

#[tokio::test]
async fn failed_reload_serves_last_good_bundle() {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), POLICY_V1);
    let evaluator = EmbeddedEvaluator::start(config_for(dir.path())).await.unwrap();

    fs::write(dir.path().join("authz").join("rbac.rego"), "package authz.rbac\nallow := {").unwrap();
    assert!(evaluator.reload().await.is_err());
    assert!(evaluator.last_reload_error().is_some());
    assert!(evaluator.subscribe().borrow().error.is_some());

    let response = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap();
    assert_eq!(response.get("allow"), Some(&json!(true)));

    fs::write(dir.path().join("authz").join("rbac.rego"), POLICY_V2).unwrap();
    assert!(evaluator.reload().await.unwrap());
    assert!(evaluator.last_reload_error().is_none());
}

#[tokio::test]
async fn triggered_reload_picks_up_changes() {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), POLICY_V1);
    let evaluator = EmbeddedEvaluator::start(config_for(dir.path())).await.unwrap();
    let mut status = evaluator.subscribe();
    let before = evaluator.revision();

    fs::write(dir.path().join("authz").join("rbac.rego"), POLICY_V2).unwrap();
    evaluator.trigger_reload();
    tokio::time::timeout(Duration::from_secs(5), status.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(evaluator.revision(), before + 1);
    evaluator.shutdown().await;
}

#[tokio::test]
async fn periodic_reload_runs_on_interval() {
    let dir = TempDir::new().unwrap();
    write_bundle(dir.path(), POLICY_V1);
    let config = config_for(dir.path()).with_reload_interval(Duration::from_millis(20));
    let evaluator = EmbeddedEvaluator::start(config).await.unwrap();
    let mut status = evaluator.subscribe();

    fs::write(dir.path().join("authz").join("rbac.rego"), POLICY_V2).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            status.changed().await.unwrap();
            if status.borrow_and_update().revision > 1 {
                break;
            }
        }
    })
    .await
    .unwrap();
    evaluator.shutdown().await;
}

#[tokio::test]
async fn single_file_and_document_sources() {
    let dir = TempDir::new().unwrap();
    let rego = dir.path().join("policy.rego");
    fs::write(&rego, POLICY_V2).unwrap();
    let evaluator = EmbeddedEvaluator::start(
        EmbeddedConfig::default()
            .with_bundle_url(format!("file://{}", rego.display()))
            .with_reload_interval(Duration::ZERO),
    )
    .await
    .unwrap();
    let response = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap();
    assert_eq!(response.get("reason"), Some(&json!("frozen")));

    let doc = dir.path().join("bundle.json");
    let bundle = json!({
        "modules": {"authz/rbac.rego": POLICY_V1},
        "data": {"roles": {"viewer": ["list"]}}
    });
    fs::write(&doc, bundle.to_string()).unwrap();
    let evaluator = EmbeddedEvaluator::start(
        EmbeddedConfig::default()
            .with_bundle_url(doc.display().to_string())
            .with_reload_interval(Duration::ZERO),
    )
    .await
    .unwrap();
    let response = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap();
    assert_eq!(response.get("allow"), Some(&json!(true)));
}

#[tokio::test]
async fn missing_bundle_fails_start() {
    let err = EmbeddedEvaluator::start(
        EmbeddedConfig::default().with_bundle_url("file:///definitely/not/here"),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(err.code(), codes::EVALUATOR_UNAVAILABLE);
}

#[tokio::test]
async fn http_bundle_honors_etag() {
    let bundle = json!({
        "modules": {"authz/rbac.rego": POLICY_V2},
        "data": {}
    })
    .to_string();
    let app = Router::new().route(
        "/bundle",
        get(move |headers: HeaderMap| {
            let bundle = bundle.clone();
            async move {
                if headers.get("if-none-match").map_or(false, |v| v == "\"v1\"") {
                    StatusCode::NOT_MODIFIED.into_response()
                } else {
                    (StatusCode::OK, [("etag", "\"v1\"")], bundle).into_response()
                }
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let evaluator = EmbeddedEvaluator::start(
        EmbeddedConfig::default()
            .with_bundle_url(format!("http://{addr}/bundle"))
            .with_reload_interval(Duration::ZERO),
    )
    .await
    .unwrap();
    let revision = evaluator.revision();

    assert!(!evaluator.reload().await.unwrap());
    assert_eq!(evaluator.revision(), revision);

    let response = evaluator
        .evaluate(&RequestScope::new(), paths::VALIDATE_V1, &wrapped("list"))
        .await
        .unwrap();
    assert_eq!(response.get("reason"), Some(&json!("frozen")));
}
