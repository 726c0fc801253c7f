use serde_json::{Map, Value};

use crate::errors::{invalid_obligations, ObligationsError};
use crate::model::ObligationsNode;

/// Only policies under this namespace contribute to map-shaped obligations.
pub const ABAC_POLICY_PREFIX: &str = "abac.";

/// Normalizes an engine `obligations` value into a tree.
///
/// Accepts the array shape `[[cond, ..], ..]` and the map shape
/// `{policy: {statement: [cond, ..]}}`. `null` yields `Ok(None)`; any other
/// shape is rejected.
pub fn parse_obligations(value: &Value) -> Result<Option<ObligationsNode>, ObligationsError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(outer) => parse_array_shape(outer).map(Some),
        Value::Object(policies) => parse_map_shape(policies).map(Some),
        other => Err(invalid_obligations(&format!(
            "expected array or object, got {}",
            json_type(other)
        ))),
    }
}

fn parse_array_shape(outer: &[Value]) -> Result<ObligationsNode, ObligationsError> {
    let mut groups = Vec::new();
    for (idx, element) in outer.iter().enumerate() {
        let Value::Array(inner) = element else {
            return Err(invalid_obligations(&format!(
                "obligations[{idx}]: expected array, got {}",
                json_type(element)
            )));
        };
        let leaves = conditions(inner, || format!("obligations[{idx}]"))?;
        if !leaves.is_empty() {
            groups.push(ObligationsNode::or(leaves));
        }
    }
    Ok(root_or_empty(groups))
}

fn parse_map_shape(policies: &Map<String, Value>) -> Result<ObligationsNode, ObligationsError> {
    let mut policy_nodes = Vec::new();
    for (policy, statements) in policies {
        if !policy.starts_with(ABAC_POLICY_PREFIX) {
            tracing::trace!(policy = %policy, "skipping non-abac obligations policy");
            continue;
        }
        let Value::Object(statements) = statements else {
            return Err(invalid_obligations(&format!(
                "obligations.{policy}: expected object, got {}",
                json_type(statements)
            )));
        };

        let mut statement_nodes = Vec::new();
        for (statement, conds) in statements {
            let Value::Array(conds) = conds else {
                return Err(invalid_obligations(&format!(
                    "obligations.{policy}.{statement}: expected array, got {}",
                    json_type(conds)
                )));
            };
            let leaves = conditions(conds, || format!("obligations.{policy}.{statement}"))?;
            if !leaves.is_empty() {
                statement_nodes.push(ObligationsNode::or(leaves).with_tag(statement.as_str()));
            }
        }

        if !statement_nodes.is_empty() {
            policy_nodes.push(ObligationsNode::or(statement_nodes).with_tag(policy.as_str()));
        }
    }
    Ok(root_or_empty(policy_nodes))
}

fn conditions<F>(items: &[Value], location: F) -> Result<Vec<ObligationsNode>, ObligationsError>
where
    F: Fn() -> String,
{
    let mut leaves = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match item {
            // A blank condition carries no constraint.
            Value::String(text) if text.is_empty() => {}
            Value::String(text) => leaves.push(ObligationsNode::condition(text.as_str())),
            other => {
                return Err(invalid_obligations(&format!(
                    "{}[{idx}]: expected string, got {}",
                    location(),
                    json_type(other)
                )))
            }
        }
    }
    Ok(leaves)
}

fn root_or_empty(children: Vec<ObligationsNode>) -> ObligationsNode {
    if children.is_empty() {
        ObligationsNode::empty()
    } else {
        ObligationsNode::or(children)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
