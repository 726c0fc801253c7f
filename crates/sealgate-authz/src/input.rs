use std::any::Any;

use async_trait::async_trait;
use sealgate_types::prelude::*;

use crate::errors::AuthzError;

/// Application hook that describes a request to the policy engine.
///
/// Returning `Ok(None)` means the request cannot be described and is
/// rejected as an invalid argument.
#[async_trait]
pub trait DecisionInputHandler: Send + Sync {
    async fn decision_input(
        &self,
        scope: &RequestScope,
        full_method: &str,
        request: &(dyn Any + Send + Sync),
    ) -> Result<Option<DecisionInput>, AuthzError>;
}

/// Reads [`AbacType`] and [`AbacVerb`] from the scope and queries a fixed
/// document.
#[derive(Clone, Debug, Default)]
pub struct DefaultDecisionInputHandler {
    document: String,
}

impl DefaultDecisionInputHandler {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }
}

#[async_trait]
impl DecisionInputHandler for DefaultDecisionInputHandler {
    async fn decision_input(
        &self,
        scope: &RequestScope,
        _full_method: &str,
        _request: &(dyn Any + Send + Sync),
    ) -> Result<Option<DecisionInput>, AuthzError> {
        let abac_type = scope.get::<AbacType>().map(|t| t.0.clone()).unwrap_or_default();
        let abac_verb = scope.get::<AbacVerb>().map(|v| v.0.clone()).unwrap_or_default();
        Ok(Some(
            DecisionInput::new(abac_type, abac_verb).with_document(self.document.clone()),
        ))
    }
}

#[async_trait]
impl<F> DecisionInputHandler for F
where
    F: Fn(&RequestScope, &str) -> Option<DecisionInput> + Send + Sync,
{
    async fn decision_input(
        &self,
        scope: &RequestScope,
        full_method: &str,
        _request: &(dyn Any + Send + Sync),
    ) -> Result<Option<DecisionInput>, AuthzError> {
        Ok(self(scope, full_method))
    }
}
