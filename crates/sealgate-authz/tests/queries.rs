use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use sealgate_authz::prelude::*;
use sealgate_errors::prelude::codes;
use sealgate_evaluator::prelude::RemoteEvaluator;
use sealgate_types::prelude::*;
use serde_json::{json, Value};

type Inputs = Arc<Mutex<Vec<(String, Value)>>>;

/// Mock engine that answers the rbac helper documents.
async fn engine() -> (String, Inputs) {
    let inputs: Inputs = Arc::default();
    let app = Router::new()
        .route("/v1/data/authz/rbac/:document", post(answer))
        .with_state(inputs.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), inputs)
}

async fn answer(
    State(inputs): State<Inputs>,
    Path(document): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    inputs.lock().unwrap().push((document.clone(), body.clone()));
    let input = &body["input"];
    let result = match document.as_str() {
        "acct_entitlements_api" => {
            let mut accounts = serde_json::Map::new();
            for acct in input["acct_entitlements_acct_ids"].as_array().unwrap() {
                accounts.insert(
                    acct.as_str().unwrap().to_string(),
                    json!({"lic": ["dhcp", "ipam"]}),
                );
            }
            Value::Object(accounts)
        }
        "current_user_compartments" => json!(["root", "root.eng"]),
        "filter_compartment_permissions_api" => {
            let permissions = input["permissions"].as_array().unwrap();
            Value::Array(
                permissions
                    .iter()
                    .filter(|p| p.as_str().unwrap().starts_with("read"))
                    .cloned()
                    .collect(),
            )
        }
        "filter_compartment_features_api" => json!({"lic": ["dhcp"]}),
        _ => return Json(json!({})),
    };
    Json(json!({ "result": result }))
}

fn scope() -> RequestScope {
    let metadata: Metadata = [(AUTHORIZATION_HEADER, "Bearer h.p.s")].into_iter().collect();
    RequestScope::new()
        .with_request_id("req-q")
        .with_metadata(metadata)
}

fn authorizer(address: &str) -> Authorizer {
    let remote = RemoteEvaluator::builder(address).build().unwrap();
    Authorizer::builder("atlas.tagging", Arc::new(remote)).build()
}

#[tokio::test]
async fn acct_entitlements_returns_nested_map() {
    let (address, inputs) = engine().await;
    let entitlements = authorizer(&address)
        .acct_entitlements(
            &scope(),
            &["a1".to_string(), "a2".to_string()],
            &["lic".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(entitlements.len(), 2);
    assert_eq!(entitlements["a1"]["lic"], ["dhcp", "ipam"]);

    let (document, body) = inputs.lock().unwrap()[0].clone();
    assert_eq!(document, "acct_entitlements_api");
    assert_eq!(
        body,
        json!({"input": {
            "acct_entitlements_acct_ids": ["a1", "a2"],
            "acct_entitlements_services": ["lic"]
        }})
    );
}

#[tokio::test]
async fn compartment_queries_send_the_jwt() {
    let (address, inputs) = engine().await;
    let authz = authorizer(&address);

    let compartments = authz.current_user_compartments(&scope()).await.unwrap();
    assert_eq!(compartments, ["root", "root.eng"]);

    let allowed = authz
        .filter_compartment_permissions(
            &scope(),
            &["read_tags".to_string(), "write_tags".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(allowed, ["read_tags"]);

    let mut wanted = BTreeMap::new();
    wanted.insert("lic".to_string(), vec!["dhcp".to_string(), "ipam".to_string()]);
    let features = authz
        .filter_compartment_features(&scope(), &wanted)
        .await
        .unwrap();
    assert_eq!(features["lic"], ["dhcp"]);

    let seen = inputs.lock().unwrap().clone();
    assert_eq!(seen[0].1, json!({"input": {"jwt": "h.p.s"}}));
    assert_eq!(seen[1].1["input"]["application"], json!("atlas.tagging"));
    assert_eq!(seen[1].1["input"]["jwt"], json!("h.p.s"));
    assert_eq!(
        seen[2].1["input"]["entitled_features"],
        json!({"lic": ["dhcp", "ipam"]})
    );
}

#[tokio::test]
async fn compartment_queries_require_a_bearer() {
    let (address, _) = engine().await;
    let err = authorizer(&address)
        .current_user_compartments(&RequestScope::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::AUTH_UNAUTHENTICATED);
}

#[tokio::test]
async fn opa_query_unwraps_object_results_only() {
    let (address, _) = engine().await;
    let authz = authorizer(&address);

    let response = authz
        .opa_query(
            &scope(),
            "v1/data/authz/rbac/filter_compartment_features_api",
            &json!({"input": {}}),
        )
        .await
        .unwrap();
    assert_eq!(Value::Object(response), json!({"lic": ["dhcp"]}));

    let response = authz
        .opa_query(
            &scope(),
            "v1/data/authz/rbac/current_user_compartments",
            &json!({"input": {"jwt": "h.p.s"}}),
        )
        .await
        .unwrap();
    assert_eq!(response.get("result"), Some(&json!(["root", "root.eng"])));
}

#[tokio::test]
async fn undefined_document_yields_empty_value() {
    let (address, _) = engine().await;
    let authz = authorizer(&address);
    let response = authz
        .opa_query(&scope(), "v1/data/authz/rbac/missing", &json!({"input": {}}))
        .await
        .unwrap();
    assert!(response.is_empty());
}

#[tokio::test]
async fn malformed_entitlements_are_rejected() {
    let app = Router::new().fallback(|| async { Json(json!({"result": "oops"})) });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let authz = authorizer(&format!("http://{addr}"));

    let err = authz
        .acct_entitlements(&scope(), &["a1".to_string()], &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), codes::AUTHZ_INVALID_ENTITLED_FEATURES);

    let err = authz.current_user_compartments(&scope()).await.unwrap_err();
    assert_eq!(err.code(), codes::UNKNOWN_INTERNAL);
}
