use crate::{disposition::Disposition, model::ErrorObj};
use serde::Serialize;
use serde_json::{Map, Value};

/// What a caller of the authorizer may see. Developer detail never appears here.
#[derive(Debug, Serialize)]
pub struct PublicErrorView {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Log-side view of an error, including engine detail.
#[derive(Debug, Serialize)]
pub struct AuditErrorView {
    pub code: &'static str,
    pub kind: &'static str,
    pub disposition: &'static str,
    pub http_status: u16,
    pub grpc_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_dev: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorObj {
    pub fn to_public(&self) -> PublicErrorView {
        PublicErrorView {
            code: self.code.0,
            message: self.message_user.clone(),
            correlation_id: self.correlation_id.clone(),
        }
    }

    pub fn to_audit(&self) -> AuditErrorView {
        AuditErrorView {
            code: self.code.0,
            kind: self.kind.as_str(),
            disposition: Disposition::as_str(self.disposition),
            http_status: self.http_status,
            grpc_code: self.grpc_code,
            message_dev: self.message_dev.clone(),
            meta: self.meta.clone(),
            correlation_id: self.correlation_id.clone(),
        }
    }
}
