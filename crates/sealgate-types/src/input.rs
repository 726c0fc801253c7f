use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-provided part of the decision input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionInput {
    #[serde(rename = "type")]
    pub abac_type: String,
    #[serde(rename = "verb")]
    pub abac_verb: String,
    #[serde(rename = "ctx", default)]
    pub seal_ctx: Vec<Value>,
    /// Policy path to query; empty selects the engine default. Never serialized.
    #[serde(skip)]
    pub decision_document: String,
}

impl DecisionInput {
    pub fn new(abac_type: impl Into<String>, abac_verb: impl Into<String>) -> Self {
        Self {
            abac_type: abac_type.into(),
            abac_verb: abac_verb.into(),
            ..Self::default()
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.decision_document = document.into();
        self
    }

    pub fn with_ctx(mut self, attribute: Value) -> Self {
        self.seal_ctx.push(attribute);
        self
    }
}

/// Full input sent to the policy engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub endpoint: String,
    pub application: String,
    pub full_method: String,
    pub jwt: String,
    pub request_id: String,
    pub entitled_services: Vec<String>,
    #[serde(flatten)]
    pub decision_input: DecisionInput,
}

impl Payload {
    pub fn decision_document(&self) -> &str {
        &self.decision_input.decision_document
    }
}
