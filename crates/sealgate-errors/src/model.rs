use crate::{
    code::{spec_of, CodeSpec, ErrorCode},
    disposition::Disposition,
    kind::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A registered error, carrying both the caller-facing message and
/// whatever detail the producing layer attached for logs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorObj {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message_user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_dev: Option<String>,
    pub http_status: u16,
    pub grpc_code: i32,
    pub disposition: Disposition,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorObj {
    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }

    pub fn is_retryable(&self) -> bool {
        self.disposition == Disposition::Retry
    }

    /// Cancellation and deadline errors describe the caller, not the decision.
    pub fn is_request_scoped(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled | ErrorKind::DeadlineExceeded)
    }
}

impl fmt::Display for ErrorObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code.0)?;
        f.write_str(": ")?;
        f.write_str(&self.message_user)?;
        match &self.message_dev {
            Some(dev) => write!(f, " ({dev})"),
            None => Ok(()),
        }
    }
}

/// Builds an [`ErrorObj`] from a registered code. Kind, statuses and
/// disposition always come from the registry entry.
pub struct ErrorBuilder {
    spec: &'static CodeSpec,
    user: Option<String>,
    dev: Option<String>,
    meta: Map<String, Value>,
    correlation: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            spec: spec_of(code),
            user: None,
            dev: None,
            meta: Map::new(),
            correlation: None,
        }
    }

    /// Overrides the registry's default user message.
    pub fn user_msg(self, message: impl Into<String>) -> Self {
        Self {
            user: Some(message.into()),
            ..self
        }
    }

    pub fn dev_msg(self, message: impl Into<String>) -> Self {
        Self {
            dev: Some(message.into()),
            ..self
        }
    }

    pub fn meta_kv(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn correlation(self, id: impl Into<String>) -> Self {
        Self {
            correlation: Some(id.into()),
            ..self
        }
    }

    pub fn build(self) -> ErrorObj {
        let spec = self.spec;
        ErrorObj {
            code: spec.code,
            kind: spec.kind,
            message_user: self.user.unwrap_or_else(|| spec.default_user_msg.to_owned()),
            message_dev: self.dev,
            http_status: spec.http_status,
            grpc_code: spec.grpc_code,
            disposition: spec.disposition,
            meta: self.meta,
            correlation_id: self.correlation,
        }
    }
}
