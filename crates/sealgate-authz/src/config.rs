use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sealgate_evaluator::prelude::{EmbeddedConfig, EmbeddedEvaluator, EvalError, Evaluator, RemoteConfig};
use sealgate_types::prelude::paths;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::authorizer::{Authorizer, AuthorizerBuilder};
use crate::endpoint::HttpEndpointModifier;
use crate::errors::ConfigError;
use crate::input::DefaultDecisionInputHandler;
use crate::jwt::JwtMode;

pub const ENV_PREFIX: &str = "SEALGATE__";

const KIND_KEY: &str = "kind";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub application: String,
    pub entitled_services: Vec<String>,
    /// Document queried by the default input handler; empty selects the
    /// engine default.
    pub decision_path: String,
    pub jwt_mode: JwtMode,
    pub endpoint_modifier: Option<HttpEndpointModifier>,
    pub evaluator: EvaluatorConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            application: String::new(),
            entitled_services: Vec::new(),
            decision_path: paths::VALIDATE_V1.to_string(),
            jwt_mode: JwtMode::default(),
            endpoint_modifier: None,
            evaluator: EvaluatorConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluatorConfig {
    Remote(RemoteConfig),
    Embedded(EmbeddedConfig),
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig::Remote(RemoteConfig::default())
    }
}

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub path: Option<PathBuf>,
    pub include_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            include_env: true,
        }
    }
}

/// Defaults, then the YAML file at `path`, then `SEALGATE__*` variables.
pub fn load_config(path: Option<&Path>) -> Result<GateConfig, ConfigError> {
    load_config_with_options(&LoadOptions {
        path: path.map(Path::to_path_buf),
        include_env: true,
    })
}

pub fn load_config_with_options(options: &LoadOptions) -> Result<GateConfig, ConfigError> {
    let mut root = default_tree()?;

    if let Some(path) = &options.path {
        let content = fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(format!("{}: {}", path.display(), err)))?;
        merge_value(&mut root, yaml_to_json(&content)?);
    }

    if options.include_env {
        for (path, value) in overlays_from_env() {
            apply_overlay(&mut root, &path, value)?;
        }
    }

    serde_json::from_value(root).map_err(|err| ConfigError::Invalid(err.to_string()))
}

impl GateConfig {
    /// Defaults overlaid with a YAML document; the environment is ignored.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let mut root = default_tree()?;
        merge_value(&mut root, yaml_to_json(content)?);
        serde_json::from_value(root).map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    pub async fn build_evaluator(&self) -> Result<Arc<dyn Evaluator>, EvalError> {
        match &self.evaluator {
            EvaluatorConfig::Remote(remote) => Ok(Arc::new(remote.build()?)),
            EvaluatorConfig::Embedded(embedded) => {
                Ok(Arc::new(EmbeddedEvaluator::start(embedded.clone()).await?))
            }
        }
    }

    /// Builder preloaded with this configuration; claims and input handler
    /// can still be replaced.
    pub fn authorizer_builder(&self, evaluator: Arc<dyn Evaluator>) -> AuthorizerBuilder {
        let mut builder = Authorizer::builder(self.application.clone(), evaluator)
            .entitled_services(self.entitled_services.clone())
            .jwt_mode(self.jwt_mode)
            .input_handler(DefaultDecisionInputHandler::new(self.decision_path.clone()));
        if let Some(modifier) = &self.endpoint_modifier {
            builder = builder.endpoint_modifier(modifier.clone());
        }
        builder
    }

    pub async fn build_authorizer(&self) -> Result<Authorizer, EvalError> {
        let evaluator = self.build_evaluator().await?;
        Ok(self.authorizer_builder(evaluator).build())
    }
}

fn default_tree() -> Result<Value, ConfigError> {
    serde_json::to_value(GateConfig::default()).map_err(|err| ConfigError::Invalid(err.to_string()))
}

fn yaml_to_json(content: &str) -> Result<Value, ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|err| ConfigError::Invalid(err.to_string()))?;
    let json = serde_json::to_value(yaml).map_err(|err| ConfigError::Invalid(err.to_string()))?;
    match json {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(json),
        other => Err(ConfigError::Invalid(format!(
            "config root must be a mapping, found {other}"
        ))),
    }
}

/// Deep merge. A section whose `kind` changes is replaced, not merged.
fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let kind_changed = match (base.get(KIND_KEY), overlay.get(KIND_KEY)) {
                (Some(old), Some(new)) => old != new,
                _ => false,
            };
            if kind_changed {
                *base = overlay;
                return;
            }
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn overlays_from_env() -> Vec<(Vec<String>, Value)> {
    let mut overlays: Vec<(Vec<String>, Value)> = env::vars()
        .filter_map(|(key, raw)| {
            let stripped = key.strip_prefix(ENV_PREFIX)?;
            let path: Vec<String> = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect();
            (!path.is_empty()).then(|| (path, parse_env_value(&raw)))
        })
        .collect();
    // `kind` switches reset their section, so they go first.
    overlays.sort_by_key(|(path, _)| path.last().map(String::as_str) != Some(KIND_KEY));
    overlays
}

fn apply_overlay(root: &mut Value, path: &[String], value: Value) -> Result<(), ConfigError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    let mut cursor = root;
    for segment in parents {
        let map = cursor
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnsupportedPath(path.join(".")))?;
        cursor = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    let map = cursor
        .as_object_mut()
        .ok_or_else(|| ConfigError::UnsupportedPath(path.join(".")))?;
    if last == KIND_KEY && map.get(KIND_KEY) != Some(&value) {
        map.clear();
    }
    map.insert(last.clone(), value);
    Ok(())
}

/// JSON first, then bool, then integer, else the raw string.
fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    Value::String(raw.to_string())
}
