use sealgate_errors::prelude::*;
use serde_json::json;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct EvalError(pub Box<ErrorObj>);

impl EvalError {
    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code
    }

    pub fn unavailable(msg: &str) -> Self {
        Self::from_builder(ErrorBuilder::new(codes::EVALUATOR_UNAVAILABLE).dev_msg(msg))
    }

    pub fn invalid_argument(msg: &str) -> Self {
        Self::from_builder(ErrorBuilder::new(codes::EVALUATOR_INVALID_ARGUMENT).dev_msg(msg))
    }

    pub fn permission_denied(msg: &str) -> Self {
        Self::from_builder(ErrorBuilder::new(codes::EVALUATOR_PERMISSION_DENIED).dev_msg(msg))
    }

    pub fn not_found(msg: &str) -> Self {
        Self::from_builder(ErrorBuilder::new(codes::EVALUATOR_NOT_FOUND).dev_msg(msg))
    }

    pub fn internal(msg: &str) -> Self {
        Self::from_builder(ErrorBuilder::new(codes::EVALUATOR_INTERNAL).dev_msg(msg))
    }

    pub fn unknown(msg: &str) -> Self {
        Self::from_builder(ErrorBuilder::new(codes::UNKNOWN_INTERNAL).dev_msg(msg))
    }

    pub fn cancelled() -> Self {
        Self::from_builder(ErrorBuilder::new(codes::REQUEST_CANCELLED))
    }

    pub fn deadline_exceeded() -> Self {
        Self::from_builder(ErrorBuilder::new(codes::REQUEST_DEADLINE_EXCEEDED))
    }

    /// Maps an engine error object's `code` onto the evaluator codes.
    pub fn from_engine(engine_code: &str, message: &str) -> Self {
        let code = match engine_code {
            "internal_error" | "internal" | "evaluation_error" | "evaluation" => {
                codes::EVALUATOR_INTERNAL
            }
            "unauthorized" => codes::EVALUATOR_PERMISSION_DENIED,
            "invalid_parameter" | "invalid_operation" => codes::EVALUATOR_INVALID_ARGUMENT,
            "resource_not_found" | "resource_conflict" | "undefined_document" => {
                codes::EVALUATOR_NOT_FOUND
            }
            "ServiceUnavailable" | "service_unavailable" => codes::EVALUATOR_UNAVAILABLE,
            _ => codes::UNKNOWN_INTERNAL,
        };
        Self::from_builder(
            ErrorBuilder::new(code)
                .dev_msg(message)
                .meta_kv("engine_code", json!(engine_code)),
        )
    }

    fn from_builder(builder: ErrorBuilder) -> Self {
        EvalError(Box::new(builder.build()))
    }
}

impl From<ErrorObj> for EvalError {
    fn from(value: ErrorObj) -> Self {
        EvalError(Box::new(value))
    }
}

impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            EvalError::unavailable(&format!("engine transport: {err}"))
        } else {
            EvalError::unknown(&format!("engine request failed: {err}"))
        }
    }
}
