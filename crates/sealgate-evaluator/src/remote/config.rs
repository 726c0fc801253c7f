use std::time::Duration;

use sealgate_types::prelude::paths;
use serde::{Deserialize, Serialize};

use crate::errors::EvalError;
use crate::remote::client::{RemoteEvaluator, RemoteEvaluatorBuilder};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub address: String,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            address: paths::DEFAULT_ADDRESS.to_string(),
            timeout_ms: 5_000,
            connect_timeout_ms: 1_000,
            user_agent: None,
        }
    }
}

impl RemoteConfig {
    pub fn builder(&self) -> RemoteEvaluatorBuilder {
        let mut builder = RemoteEvaluator::builder(&self.address);
        if self.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(self.timeout_ms));
        }
        if self.connect_timeout_ms > 0 {
            builder = builder.connect_timeout(Duration::from_millis(self.connect_timeout_ms));
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder
    }

    pub fn build(&self) -> Result<RemoteEvaluator, EvalError> {
        self.builder().build()
    }
}
