use std::any::Any;
use std::sync::Arc;

use sealgate_evaluator::prelude::{EvalError, Evaluator};
use sealgate_obligations::prelude::{flatten_features, parse_obligations, EntitledFeatures};
use sealgate_types::prelude::*;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::claims::{ClaimsVerifier, PassthroughClaims};
use crate::decision::Decision;
use crate::endpoint::{short_endpoint, HttpEndpointModifier};
use crate::errors::{self, AuthzError};
use crate::input::{DecisionInputHandler, DefaultDecisionInputHandler};
use crate::jwt::{redact_full, JwtMode};

const ALLOW_KEY: &str = "allow";
const RESULT_KEY: &str = "result";

/// Decision pipeline bound to one application and one evaluator.
///
/// Read-only after construction and cheap to share behind an `Arc`.
pub struct Authorizer {
    application: String,
    evaluator: Arc<dyn Evaluator>,
    claims: Arc<dyn ClaimsVerifier>,
    input_handler: Arc<dyn DecisionInputHandler>,
    entitled_services: Vec<String>,
    jwt_mode: JwtMode,
    endpoint_modifier: Option<HttpEndpointModifier>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("application", &self.application)
            .field("entitled_services", &self.entitled_services)
            .field("jwt_mode", &self.jwt_mode)
            .field("endpoint_modifier", &self.endpoint_modifier)
            .finish_non_exhaustive()
    }
}

pub struct AuthorizerBuilder {
    application: String,
    evaluator: Arc<dyn Evaluator>,
    claims: Arc<dyn ClaimsVerifier>,
    input_handler: Arc<dyn DecisionInputHandler>,
    entitled_services: Vec<String>,
    jwt_mode: JwtMode,
    endpoint_modifier: Option<HttpEndpointModifier>,
}

impl AuthorizerBuilder {
    pub fn claims<C>(mut self, claims: C) -> Self
    where
        C: ClaimsVerifier + 'static,
    {
        self.claims = Arc::new(claims);
        self
    }

    pub fn input_handler<H>(mut self, handler: H) -> Self
    where
        H: DecisionInputHandler + 'static,
    {
        self.input_handler = Arc::new(handler);
        self
    }

    pub fn shared_input_handler(mut self, handler: Arc<dyn DecisionInputHandler>) -> Self {
        self.input_handler = handler;
        self
    }

    pub fn entitled_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entitled_services = services.into_iter().map(Into::into).collect();
        self
    }

    pub fn jwt_mode(mut self, mode: JwtMode) -> Self {
        self.jwt_mode = mode;
        self
    }

    pub fn endpoint_modifier(mut self, modifier: HttpEndpointModifier) -> Self {
        self.endpoint_modifier = Some(modifier);
        self
    }

    pub fn build(self) -> Authorizer {
        Authorizer {
            application: self.application,
            evaluator: self.evaluator,
            claims: self.claims,
            input_handler: self.input_handler,
            entitled_services: self.entitled_services,
            jwt_mode: self.jwt_mode,
            endpoint_modifier: self.endpoint_modifier,
        }
    }
}

impl Authorizer {
    /// Defaults: [`PassthroughClaims`], a [`DefaultDecisionInputHandler`]
    /// querying the engine default document, raw JWT, no endpoint modifier.
    pub fn builder(application: impl Into<String>, evaluator: Arc<dyn Evaluator>) -> AuthorizerBuilder {
        AuthorizerBuilder {
            application: application.into(),
            evaluator,
            claims: Arc::new(PassthroughClaims),
            input_handler: Arc::new(DefaultDecisionInputHandler::default()),
            entitled_services: Vec::new(),
            jwt_mode: JwtMode::default(),
            endpoint_modifier: None,
        }
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    pub fn entitled_services(&self) -> &[String] {
        &self.entitled_services
    }

    /// Runs the full pipeline for one request.
    ///
    /// Hard failures (claims, input handler, engine, cancellation) return
    /// `Err` and leave the caller's scope untouched. A deny or an enrichment
    /// failure is reported in [`Decision::error`] next to the enriched scope.
    pub async fn evaluate(
        &self,
        scope: &RequestScope,
        full_method: &str,
        request: &(dyn Any + Send + Sync),
    ) -> Result<Decision, AuthzError> {
        let jwt = self.raw_jwt(scope)?;
        let input = match self
            .input_handler
            .decision_input(scope, full_method, request)
            .await
        {
            Ok(Some(input)) => input,
            Ok(None) => {
                return Err(errors::invalid_argument(
                    "decision input handler returned no input",
                ))
            }
            Err(err) => {
                return Err(errors::invalid_argument(&format!(
                    "decision input handler failed: {err}"
                )))
            }
        };
        self.decide(scope, full_method, &jwt, input).await
    }

    /// Runs the pipeline with a caller-built input, skipping the input
    /// handler. Deny and enrichment failures both surface as `Err`.
    pub async fn affirm_authorization(
        &self,
        scope: &RequestScope,
        full_method: &str,
        input: DecisionInput,
    ) -> Result<RequestScope, AuthzError> {
        let jwt = self.raw_jwt(scope)?;
        self.decide(scope, full_method, &jwt, input)
            .await?
            .ensure_allowed()
    }

    pub(crate) fn raw_jwt(&self, scope: &RequestScope) -> Result<String, AuthzError> {
        let outcome = self.claims.verify(
            scope.metadata.get(AUTHORIZATION_HEADER),
            scope.metadata.get(SET_AUTHORIZATION_HEADER),
        );
        if !outcome.is_ok() {
            return Err(errors::unauthenticated(&outcome.errors.join("; ")));
        }
        Ok(outcome.raw_jwt)
    }

    pub(crate) fn request_id(scope: &RequestScope) -> String {
        scope
            .request_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(NO_REQUEST_ID)
            .to_string()
    }

    async fn decide(
        &self,
        scope: &RequestScope,
        full_method: &str,
        jwt: &str,
        input: DecisionInput,
    ) -> Result<Decision, AuthzError> {
        let request_id = Self::request_id(scope);
        let full_method = match &self.endpoint_modifier {
            Some(modifier) => modifier.apply(full_method),
            None => full_method.to_string(),
        };
        let document = input.decision_document.clone();

        let payload = Payload {
            endpoint: short_endpoint(&full_method),
            application: self.application.clone(),
            full_method,
            jwt: self.jwt_mode.apply(jwt),
            request_id: request_id.clone(),
            entitled_services: self.entitled_services.clone(),
            decision_input: input,
        };
        let body = serde_json::to_value(&payload)
            .map_err(|err| errors::invalid_argument(&format!("payload serialization failed: {err}")))?;
        let body = if document.is_empty() {
            body
        } else {
            json!({ "input": body })
        };

        debug!(
            request_id = %request_id,
            endpoint = %payload.endpoint,
            document = %document,
            jwt = %redact_full(jwt),
            "evaluating decision"
        );

        let response = self
            .call_evaluator(scope, &document, &body, &request_id)
            .await?;
        let response = unwrap_result(response);

        let mut enriched = scope.clone();
        let mut enrich_error = None;

        match response.get(ENTITLED_FEATURES_KEY) {
            None | Some(Value::Null) => {}
            Some(raw) => match flatten_features(raw) {
                Ok(_) => {
                    enriched.insert(EntitledFeatures(raw.clone()));
                }
                Err(err) => {
                    let err = AuthzError::from(err);
                    warn!(
                        request_id = %request_id,
                        code = err.code().0,
                        detail = err.0.message_dev.as_deref().unwrap_or_default(),
                        "discarding malformed entitled_features"
                    );
                    enrich_error.get_or_insert(err);
                }
            },
        }

        if let Some(raw) = response.get(OBLIGATIONS_KEY) {
            match parse_obligations(raw) {
                Ok(Some(node)) => {
                    enriched.insert(node);
                }
                Ok(None) => {}
                Err(err) => {
                    let err = AuthzError::from(err);
                    warn!(
                        request_id = %request_id,
                        code = err.code().0,
                        detail = err.0.message_dev.as_deref().unwrap_or_default(),
                        "discarding malformed obligations"
                    );
                    enrich_error.get_or_insert(err);
                }
            }
        }

        let allow = matches!(response.get(ALLOW_KEY), Some(Value::Bool(true)));
        let error = if allow {
            enrich_error
        } else {
            debug!(request_id = %request_id, endpoint = %payload.endpoint, "decision denied");
            Some(errors::forbidden("policy denied the request"))
        };

        Ok(Decision {
            allow,
            scope: enriched,
            error,
        })
    }

    /// Calls the engine, honouring the scope's cancellation token and deadline.
    pub(crate) async fn call_evaluator(
        &self,
        scope: &RequestScope,
        document: &str,
        body: &Value,
        request_id: &str,
    ) -> Result<Map<String, Value>, AuthzError> {
        let call = self.evaluator.evaluate(scope, document, body);
        let cancel = scope.cancellation();
        let result = match scope.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(EvalError::cancelled()),
                res = tokio::time::timeout_at(deadline, call) => {
                    res.unwrap_or_else(|_| Err(EvalError::deadline_exceeded()))
                }
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(EvalError::cancelled()),
                res = call => res,
            },
        };
        result.map_err(|err| errors::opaque(err, request_id))
    }
}

/// Replaces `{"result": {..}}` with the inner object. Other shapes pass
/// through unchanged.
pub fn unwrap_result(mut response: Map<String, Value>) -> Map<String, Value> {
    if matches!(response.get(RESULT_KEY), Some(Value::Object(_))) {
        if let Some(Value::Object(inner)) = response.remove(RESULT_KEY) {
            return inner;
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_result_only_touches_object_envelopes() {
        let wrapped = json!({"result": {"allow": true}, "decision_id": "d1"});
        let Value::Object(wrapped) = wrapped else { unreachable!() };
        assert_eq!(Value::Object(unwrap_result(wrapped)), json!({"allow": true}));

        let scalar = json!({"result": true});
        let Value::Object(scalar) = scalar else { unreachable!() };
        assert_eq!(Value::Object(unwrap_result(scalar)), json!({"result": true}));

        let bare = json!({"allow": false});
        let Value::Object(bare) = bare else { unreachable!() };
        assert_eq!(Value::Object(unwrap_result(bare)), json!({"allow": false}));
    }
}
