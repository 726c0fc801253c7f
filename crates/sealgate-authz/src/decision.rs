use sealgate_errors::prelude::codes;
use sealgate_obligations::prelude::{EntitledFeatures, ObligationsNode};
use sealgate_types::prelude::RequestScope;

use crate::errors::AuthzError;

/// Outcome of one pass through the decision pipeline.
///
/// `scope` is the enriched copy of the caller's scope. It carries the
/// obligations tree and raw entitled features even when the verdict is deny.
#[derive(Clone, Debug)]
pub struct Decision {
    pub allow: bool,
    pub scope: RequestScope,
    /// `Forbidden` on deny; otherwise an enrichment failure, if any.
    pub error: Option<AuthzError>,
}

impl Decision {
    pub fn obligations(&self) -> Option<&ObligationsNode> {
        self.scope.get::<ObligationsNode>()
    }

    pub fn entitled_features(&self) -> Option<&EntitledFeatures> {
        self.scope.get::<EntitledFeatures>()
    }

    pub fn is_forbidden(&self) -> bool {
        self.error
            .as_ref()
            .map_or(false, |err| err.is(codes::AUTHZ_FORBIDDEN))
    }

    /// Fails only on deny; enrichment errors are dropped.
    pub fn into_result(self) -> Result<RequestScope, AuthzError> {
        match self.error {
            Some(err) if err.is(codes::AUTHZ_FORBIDDEN) => Err(err),
            _ => Ok(self.scope),
        }
    }

    /// Fails on deny and on any enrichment error.
    pub fn ensure_allowed(self) -> Result<RequestScope, AuthzError> {
        match self.error {
            Some(err) => Err(err),
            None if self.allow => Ok(self.scope),
            None => Err(crate::errors::forbidden("policy denied the request")),
        }
    }
}
