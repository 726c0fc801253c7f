use sealgate_errors::prelude::*;
use sealgate_evaluator::EvalError;
use sealgate_obligations::ObligationsError;
use thiserror::Error;
use tracing::warn;

#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct AuthzError(pub ErrorObj);

impl AuthzError {
    pub fn into_inner(self) -> ErrorObj {
        self.0
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code
    }

    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.0.is(code)
    }
}

impl From<ObligationsError> for AuthzError {
    fn from(err: ObligationsError) -> Self {
        AuthzError(err.into_inner())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("unsupported config path: {0}")]
    UnsupportedPath(String),
}

pub fn forbidden(msg: &str) -> AuthzError {
    AuthzError(ErrorBuilder::new(codes::AUTHZ_FORBIDDEN).dev_msg(msg).build())
}

pub fn invalid_argument(msg: &str) -> AuthzError {
    AuthzError(
        ErrorBuilder::new(codes::AUTHZ_INVALID_ARGUMENT)
            .dev_msg(msg)
            .build(),
    )
}

pub fn unauthenticated(msg: &str) -> AuthzError {
    AuthzError(
        ErrorBuilder::new(codes::AUTH_UNAUTHENTICATED)
            .dev_msg(msg)
            .build(),
    )
}

pub fn invalid_entitled_features(msg: &str) -> AuthzError {
    AuthzError(
        ErrorBuilder::new(codes::AUTHZ_INVALID_ENTITLED_FEATURES)
            .dev_msg(msg)
            .build(),
    )
}

pub fn unknown(msg: &str) -> AuthzError {
    AuthzError(ErrorBuilder::new(codes::UNKNOWN_INTERNAL).dev_msg(msg).build())
}

/// Reduces an evaluator error to the caller-facing taxonomy.
///
/// Only `ServiceUnavailable` survives as such; every other engine failure
/// becomes `UNKNOWN.INTERNAL`. Cancellation and deadline errors pass through
/// untouched. Engine detail is logged, never returned.
pub fn opaque(err: EvalError, request_id: &str) -> AuthzError {
    let inner = err.into_inner();
    if inner.is_request_scoped() {
        return AuthzError(inner);
    }

    let audit = inner.to_audit();
    warn!(
        request_id,
        code = audit.code,
        disposition = audit.disposition,
        message_dev = audit.message_dev.as_deref().unwrap_or_default(),
        "policy engine call failed"
    );

    let code = if inner.kind == ErrorKind::ServiceUnavailable {
        codes::EVALUATOR_UNAVAILABLE
    } else {
        codes::UNKNOWN_INTERNAL
    };
    AuthzError(ErrorBuilder::new(code).correlation(request_id).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_reduces_engine_errors() {
        let cases = [
            (EvalError::unavailable("refused"), codes::EVALUATOR_UNAVAILABLE),
            (EvalError::internal("stack trace"), codes::UNKNOWN_INTERNAL),
            (EvalError::permission_denied("nope"), codes::UNKNOWN_INTERNAL),
            (EvalError::invalid_argument("bad"), codes::UNKNOWN_INTERNAL),
            (EvalError::not_found("missing"), codes::UNKNOWN_INTERNAL),
            (EvalError::unknown("garbled"), codes::UNKNOWN_INTERNAL),
        ];
        for (err, expected) in cases {
            let reduced = opaque(err, "req-1");
            assert_eq!(reduced.code(), expected);
            assert!(reduced.0.message_dev.is_none());
            assert_eq!(reduced.0.correlation_id.as_deref(), Some("req-1"));
        }
    }

    #[test]
    fn opaque_passes_cancellation_through() {
        assert_eq!(
            opaque(EvalError::cancelled(), "r").code(),
            codes::REQUEST_CANCELLED
        );
        assert_eq!(
            opaque(EvalError::deadline_exceeded(), "r").code(),
            codes::REQUEST_DEADLINE_EXCEEDED
        );
    }
}
