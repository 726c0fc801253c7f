use std::sync::Arc;

use async_trait::async_trait;
use sealgate_types::prelude::RequestScope;
use serde_json::{Map, Value};

use crate::errors::EvalError;

/// A policy engine able to answer a decision query.
///
/// An empty `document` selects the engine's default decision and `input` is
/// the bare payload. A non-empty `document` names the decision and `input` is
/// already wrapped as `{"input": payload}`; the response is then usually
/// nested under `result`. Unwrapping is left to the caller.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        scope: &RequestScope,
        document: &str,
        input: &Value,
    ) -> Result<Map<String, Value>, EvalError>;
}

#[async_trait]
impl<T> Evaluator for Arc<T>
where
    T: Evaluator + ?Sized,
{
    async fn evaluate(
        &self,
        scope: &RequestScope,
        document: &str,
        input: &Value,
    ) -> Result<Map<String, Value>, EvalError> {
        (**self).evaluate(scope, document, input).await
    }
}
