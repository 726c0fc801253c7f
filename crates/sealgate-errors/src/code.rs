use crate::{disposition::Disposition, kind::ErrorKind};
use once_cell::sync::Lazy;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        REGISTRY
            .get_key_value(s.as_str())
            .map(|(key, _)| ErrorCode(key))
            .ok_or_else(|| de::Error::custom(format!("unregistered error code: {s}")))
    }
}

#[derive(Clone, Debug)]
pub struct CodeSpec {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub http_status: u16,
    /// Canonical gRPC status code for interceptors that surface this error.
    pub grpc_code: i32,
    pub disposition: Disposition,
    pub default_user_msg: &'static str,
}

pub mod codes {
    use super::ErrorCode;

    pub const AUTHZ_FORBIDDEN: ErrorCode = ErrorCode("AUTHZ.FORBIDDEN");
    pub const AUTHZ_INVALID_ARGUMENT: ErrorCode = ErrorCode("AUTHZ.INVALID_ARGUMENT");
    pub const AUTH_UNAUTHENTICATED: ErrorCode = ErrorCode("AUTH.UNAUTHENTICATED");
    pub const AUTHZ_INVALID_OBLIGATIONS: ErrorCode = ErrorCode("AUTHZ.INVALID_OBLIGATIONS");
    pub const AUTHZ_INVALID_ENTITLED_FEATURES: ErrorCode =
        ErrorCode("AUTHZ.INVALID_ENTITLED_FEATURES");
    pub const EVALUATOR_UNAVAILABLE: ErrorCode = ErrorCode("EVALUATOR.UNAVAILABLE");
    pub const EVALUATOR_INVALID_ARGUMENT: ErrorCode = ErrorCode("EVALUATOR.INVALID_ARGUMENT");
    pub const EVALUATOR_PERMISSION_DENIED: ErrorCode = ErrorCode("EVALUATOR.PERMISSION_DENIED");
    pub const EVALUATOR_NOT_FOUND: ErrorCode = ErrorCode("EVALUATOR.NOT_FOUND");
    pub const EVALUATOR_INTERNAL: ErrorCode = ErrorCode("EVALUATOR.INTERNAL");
    pub const REQUEST_CANCELLED: ErrorCode = ErrorCode("REQUEST.CANCELLED");
    pub const REQUEST_DEADLINE_EXCEEDED: ErrorCode = ErrorCode("REQUEST.DEADLINE_EXCEEDED");
    pub const UNKNOWN_INTERNAL: ErrorCode = ErrorCode("UNKNOWN.INTERNAL");
}

const fn entry(
    code: ErrorCode,
    kind: ErrorKind,
    http_status: u16,
    grpc_code: i32,
    disposition: Disposition,
    default_user_msg: &'static str,
) -> CodeSpec {
    CodeSpec {
        code,
        kind,
        http_status,
        grpc_code,
        disposition,
        default_user_msg,
    }
}

#[rustfmt::skip]
const TABLE: &[CodeSpec] = {
    use codes::*;
    use Disposition::{Abandon, Deny, Reject, Retry};
    &[
        entry(AUTHZ_FORBIDDEN, ErrorKind::Forbidden, 403, 7, Deny,
            "You don't have permission to perform this action."),
        entry(AUTHZ_INVALID_ARGUMENT, ErrorKind::InvalidArgument, 400, 3, Reject,
            "Your request is invalid. Please check inputs."),
        entry(AUTH_UNAUTHENTICATED, ErrorKind::Unauthenticated, 401, 16, Deny,
            "Please sign in."),
        entry(AUTHZ_INVALID_OBLIGATIONS, ErrorKind::InvalidObligations, 500, 13, Reject,
            "Authorization obligations could not be interpreted."),
        entry(AUTHZ_INVALID_ENTITLED_FEATURES, ErrorKind::InvalidEntitledFeatures, 500, 13, Reject,
            "Entitled features could not be interpreted."),
        entry(EVALUATOR_UNAVAILABLE, ErrorKind::ServiceUnavailable, 503, 14, Retry,
            "Authorization service is unavailable. Please retry later."),
        entry(EVALUATOR_INVALID_ARGUMENT, ErrorKind::InvalidArgument, 400, 3, Reject,
            "Policy engine rejected the request."),
        entry(EVALUATOR_PERMISSION_DENIED, ErrorKind::PermissionDenied, 403, 7, Deny,
            "Policy engine refused access."),
        entry(EVALUATOR_NOT_FOUND, ErrorKind::NotFound, 404, 5, Reject,
            "Policy decision not found."),
        entry(EVALUATOR_INTERNAL, ErrorKind::Internal, 500, 13, Retry,
            "Policy engine failed to evaluate."),
        entry(REQUEST_CANCELLED, ErrorKind::Cancelled, 499, 1, Abandon,
            "Request was cancelled."),
        entry(REQUEST_DEADLINE_EXCEEDED, ErrorKind::DeadlineExceeded, 504, 4, Retry,
            "Request deadline exceeded."),
        entry(UNKNOWN_INTERNAL, ErrorKind::Unknown, 500, 2, Retry,
            "Internal error. Please retry later."),
    ]
};

/// Every registered code, keyed by its dotted name.
pub static REGISTRY: Lazy<HashMap<&'static str, CodeSpec>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(TABLE.len());
    for spec in TABLE {
        let previous = map.insert(spec.code.0, spec.clone());
        assert!(previous.is_none(), "duplicate error code: {}", spec.code.0);
    }
    map
});

pub fn spec_of(code: ErrorCode) -> &'static CodeSpec {
    REGISTRY
        .get(code.0)
        .unwrap_or_else(|| panic!("unregistered error code: {}", code.0))
}
