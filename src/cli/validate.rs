use anyhow::Result;
use clap::Args;
use sealgate_authz::{Decision, DefaultDecisionInputHandler, GateConfig};
use sealgate_obligations::{compile_sql, PassthroughCompiler};
use sealgate_types::prelude::*;
use serde_json::{json, Value};

use super::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Decision document, e.g. v1/data/authz/rbac/validate_v1 ("" for the engine default)
    pub document: String,
    /// Application name placed in the payload
    pub application: String,
    /// Full method, e.g. /pkg.Service/Method
    pub endpoint: String,
    /// Raw JWT sent as the bearer token
    pub jwt: String,
    /// ABAC resource type
    #[arg(long = "type", default_value = "")]
    pub abac_type: String,
    /// ABAC verb
    #[arg(long, default_value = "")]
    pub verb: String,
    /// Request id placed in the payload
    #[arg(long)]
    pub request_id: Option<String>,
}

pub async fn cmd_validate(args: ValidateArgs, mut config: GateConfig, output: OutputFormat) -> Result<()> {
    config.application = args.application.clone();
    let evaluator = config.build_evaluator().await?;
    let authz = config
        .authorizer_builder(evaluator)
        .input_handler(DefaultDecisionInputHandler::new(args.document.clone()))
        .build();

    let metadata: Metadata = [(AUTHORIZATION_HEADER, format!("Bearer {}", args.jwt))]
        .into_iter()
        .collect();
    let mut scope = RequestScope::new()
        .with_metadata(metadata)
        .with_abac(args.abac_type.clone(), args.verb.clone());
    if let Some(id) = &args.request_id {
        scope = scope.with_request_id(id.clone());
    }

    let decision = authz.evaluate(&scope, &args.endpoint, &()).await?;
    let report = decision_report(&decision);

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Human => print_human(&decision, &report),
    }
    Ok(())
}

pub fn decision_report(decision: &Decision) -> Value {
    let obligations = decision.obligations();
    let sql = obligations
        .filter(|node| !node.is_empty())
        .and_then(|node| compile_sql(node, &PassthroughCompiler).ok());
    let mut features = decision
        .entitled_features()
        .and_then(|features| features.flatten().ok())
        .unwrap_or_default();
    features.sort();

    json!({
        "allow": decision.allow,
        "obligations": obligations,
        "obligations_sql": sql,
        "entitled_features": decision.entitled_features(),
        "flattened_features": features,
        "error": decision.error.as_ref().map(|err| err.0.to_public()),
    })
}

fn print_human(decision: &Decision, report: &Value) {
    println!("allow: {}", decision.allow);
    if let Some(node) = decision.obligations() {
        println!("obligations: {node}");
    }
    if let Some(sql) = report["obligations_sql"].as_str() {
        println!("obligations sql: {sql}");
    }
    if let Some(features) = report["flattened_features"].as_array() {
        if !features.is_empty() {
            let names: Vec<&str> = features.iter().filter_map(Value::as_str).collect();
            println!("entitled features: {}", names.join(", "));
        }
    }
    if let Some(err) = &decision.error {
        println!("error: {err}");
    }
}
