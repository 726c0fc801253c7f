use serde_json::{Map, Value};

use crate::embedded::bundle::Bundle;
use crate::embedded::config::EmbeddedConfig;
use crate::errors::EvalError;

/// Resolves the rule to evaluate for `document`.
///
/// `v1/data/authz/rbac/validate_v1` and `/authz/rbac/validate_v1` both become
/// `data.authz.rbac.validate_v1`. An empty document falls back to the
/// configured decision path, then the default decision path.
pub fn rule_path(document: &str, config: &EmbeddedConfig) -> String {
    let chosen = [
        document,
        config.decision_path.as_str(),
        config.default_decision_path.as_str(),
    ]
    .into_iter()
    .find(|path| !normalize_segments(path).is_empty())
    .unwrap_or_default();
    let segments = normalize_segments(chosen);
    if segments.is_empty() {
        "data".to_string()
    } else {
        format!("data.{segments}")
    }
}

fn normalize_segments(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches('/');
    let trimmed = match trimmed.strip_prefix("v1/data") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => trimmed,
    };
    trimmed
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Strips the `{"input": x}` envelope the pipeline adds for named documents.
pub fn unwrap_input(input: &Value) -> &Value {
    match input {
        Value::Object(map) if map.len() == 1 => map.get("input").unwrap_or(input),
        _ => input,
    }
}

#[cfg(test)]
thread_local! {
    static COMPILES: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Builds an engine from the bundle, surfacing parse errors.
fn compile(bundle: &Bundle) -> Result<regorus::Engine, EvalError> {
    #[cfg(test)]
    COMPILES.with(|count| count.set(count.get() + 1));

    let mut engine = regorus::Engine::new();
    for (name, source) in &bundle.modules {
        engine
            .add_policy(name.clone(), source.clone())
            .map_err(|err| EvalError::invalid_argument(&format!("module {name}: {err}")))?;
    }
    if !bundle.data.is_null() {
        let data = regorus::Value::from_json_str(&bundle.data.to_string())
            .map_err(|err| EvalError::invalid_argument(&format!("bundle data: {err}")))?;
        engine
            .add_data(data)
            .map_err(|err| EvalError::invalid_argument(&format!("bundle data: {err}")))?;
    }
    Ok(engine)
}

/// A bundle together with the engine compiled from it.
///
/// Modules and data are loaded once, when the snapshot is built. Each
/// decision runs on a clone of the prepared engine.
pub(crate) struct Compiled {
    pub(crate) bundle: Bundle,
    engine: regorus::Engine,
}

impl Default for Compiled {
    fn default() -> Self {
        Self {
            bundle: Bundle::default(),
            engine: regorus::Engine::new(),
        }
    }
}

impl Compiled {
    pub(crate) fn new(bundle: Bundle) -> Result<Self, EvalError> {
        let engine = compile(&bundle)?;
        Ok(Self { bundle, engine })
    }

    /// Keeps this engine but carries the metadata of a re-fetched bundle
    /// whose modules and data are unchanged.
    pub(crate) fn refreshed(&self, bundle: Bundle) -> Self {
        Self {
            bundle,
            engine: self.engine.clone(),
        }
    }

    /// Evaluates `rule` against `input`.
    pub(crate) fn decide(&self, rule: &str, input: &Value) -> Result<Map<String, Value>, EvalError> {
        let mut engine = self.engine.clone();
        let input = regorus::Value::from_json_str(&input.to_string())
            .map_err(|err| EvalError::invalid_argument(&format!("input: {err}")))?;
        engine.set_input(input);

        let result = engine
            .eval_rule(rule.to_string())
            .map_err(|err| EvalError::internal(&format!("evaluating {rule}: {err}")))?;
        if matches!(result, regorus::Value::Undefined) {
            return Err(EvalError::not_found(&format!("decision {rule} is undefined")));
        }

        let encoded = result
            .to_json_str()
            .map_err(|err| EvalError::internal(&format!("encoding {rule}: {err}")))?;
        match serde_json::from_str::<Value>(&encoded) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(EvalError::unknown(&format!(
                "decision {rule} is not an object: {other}"
            ))),
            Err(err) => Err(EvalError::unknown(&format!("decoding {rule}: {err}"))),
        }
    }
}
