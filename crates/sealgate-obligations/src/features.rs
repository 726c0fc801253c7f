use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{invalid_entitled_features, ObligationsError};

/// Raw `{service: [feature, ..]}` map as returned by the engine.
///
/// The value is stored un-flattened; call [`EntitledFeatures::flatten`] to get
/// `service.feature` strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitledFeatures(pub Value);

impl EntitledFeatures {
    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn flatten(&self) -> Result<Vec<String>, ObligationsError> {
        flatten_features(&self.0)
    }
}

/// Flattens `{service: [feature, ..]}` into `service.feature` strings.
///
/// Null services and null features are skipped. The order of the result
/// follows the map iteration order and is not meaningful.
pub fn flatten_features(value: &Value) -> Result<Vec<String>, ObligationsError> {
    let services = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(services) => services,
        _ => return Err(invalid_entitled_features("entitled_features must be an object")),
    };

    let mut flat = Vec::new();
    for (service, features) in services {
        let features = match features {
            Value::Null => continue,
            Value::Array(features) => features,
            _ => {
                return Err(invalid_entitled_features(&format!(
                    "entitled_features.{service} must be an array"
                )))
            }
        };
        for feature in features {
            match feature {
                Value::Null => {}
                Value::String(feature) => flat.push(format!("{service}.{feature}")),
                _ => {
                    return Err(invalid_entitled_features(&format!(
                        "entitled_features.{service} contains a non-string feature"
                    )))
                }
            }
        }
    }
    Ok(flat)
}
