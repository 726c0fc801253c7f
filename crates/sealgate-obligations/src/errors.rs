use sealgate_errors::prelude::*;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct ObligationsError(pub ErrorObj);

impl ObligationsError {
    pub fn into_inner(self) -> ErrorObj {
        self.0
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code
    }
}

pub fn invalid_obligations(msg: &str) -> ObligationsError {
    ObligationsError(
        ErrorBuilder::new(codes::AUTHZ_INVALID_OBLIGATIONS)
            .dev_msg(msg)
            .build(),
    )
}

pub fn invalid_entitled_features(msg: &str) -> ObligationsError {
    ObligationsError(
        ErrorBuilder::new(codes::AUTHZ_INVALID_ENTITLED_FEATURES)
            .dev_msg(msg)
            .build(),
    )
}
