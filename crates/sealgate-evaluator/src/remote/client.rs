use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use reqwest::header::CONTENT_TYPE;
use sealgate_types::prelude::{paths, RequestScope};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::errors::EvalError;
use crate::evaluator::Evaluator;
use crate::remote::headers::forward_metadata;
use crate::remote::wire::{decode_failure, decode_success};

/// Client for a policy engine reachable over its REST API.
#[derive(Clone, Debug)]
pub struct RemoteEvaluator {
    address: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl RemoteEvaluator {
    pub fn builder(address: impl Into<String>) -> RemoteEvaluatorBuilder {
        RemoteEvaluatorBuilder::new(address)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `<address>/<path>`; the path is appended verbatim.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.address, path)
    }

    /// Probes `GET <address>/health`.
    pub async fn health(&self) -> Result<(), EvalError> {
        let mut request = self.client.get(self.url_for("health"));
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(decode_failure(status, &body))
        }
    }

    /// Installs a Rego module through `PUT <address>/v1/policies/<id>`.
    pub async fn upload_rego_policy(&self, id: &str, source: &str) -> Result<(), EvalError> {
        let mut request = self
            .client
            .put(self.url_for(&format!("v1/policies/{id}")))
            .header(CONTENT_TYPE, "text/plain")
            .body(source.to_string());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            debug!(policy = id, "uploaded rego policy");
            Ok(())
        } else {
            Err(decode_failure(status, &body))
        }
    }
}

#[async_trait]
impl Evaluator for RemoteEvaluator {
    async fn evaluate(
        &self,
        scope: &RequestScope,
        document: &str,
        input: &Value,
    ) -> Result<Map<String, Value>, EvalError> {
        let url = self.url_for(document);
        let mut request = self
            .client
            .post(&url)
            .headers(forward_metadata(&scope.metadata))
            .json(input);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|err| {
            warn!(url = %url, error = %err, "policy engine request failed");
            EvalError::from(err)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        if is_engine_success(status) {
            decode_success(status, &body)
        } else {
            debug!(url = %url, status = status.as_u16(), "policy engine returned an error");
            Err(decode_failure(status, &body))
        }
    }
}

pub struct RemoteEvaluatorBuilder {
    address: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    client: Option<reqwest::Client>,
}

impl RemoteEvaluatorBuilder {
    fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout: None,
            connect_timeout: None,
            user_agent: None,
            client: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<RemoteEvaluator, EvalError> {
        let address = if self.address.trim().is_empty() {
            paths::DEFAULT_ADDRESS.to_string()
        } else {
            self.address.trim().trim_end_matches('/').to_string()
        };
        let parsed = Url::parse(&address)
            .map_err(|err| EvalError::invalid_argument(&format!("invalid engine address {address}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EvalError::invalid_argument(&format!(
                "unsupported engine address scheme: {}",
                parsed.scheme()
            )));
        }

        let client = match self.client {
            Some(client) => client,
            None => build_reqwest_client(self.connect_timeout, self.user_agent.as_deref())?,
        };

        Ok(RemoteEvaluator {
            address,
            client,
            timeout: self.timeout,
        })
    }
}

fn build_reqwest_client(
    connect_timeout: Option<Duration>,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, EvalError> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .user_agent(user_agent.unwrap_or(concat!("sealgate/", env!("CARGO_PKG_VERSION"))));
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder
        .build()
        .map_err(|err| EvalError::unknown(&format!("failed to build http client: {err}")))
}

fn is_engine_success(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}
