#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Forbidden,
    InvalidArgument,
    Unauthenticated,
    InvalidObligations,
    InvalidEntitledFeatures,
    ServiceUnavailable,
    PermissionDenied,
    NotFound,
    Internal,
    Cancelled,
    DeadlineExceeded,
    Unknown,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::Unauthenticated => "Unauthenticated",
            ErrorKind::InvalidObligations => "InvalidObligations",
            ErrorKind::InvalidEntitledFeatures => "InvalidEntitledFeatures",
            ErrorKind::ServiceUnavailable => "ServiceUnavailable",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Internal => "Internal",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::DeadlineExceeded => "DeadlineExceeded",
            ErrorKind::Unknown => "Unknown",
        }
    }

    /// Kinds that belong to the reduced taxonomy surfaced to callers.
    pub const fn is_public(self) -> bool {
        matches!(
            self,
            ErrorKind::Forbidden
                | ErrorKind::InvalidArgument
                | ErrorKind::Unauthenticated
                | ErrorKind::InvalidObligations
                | ErrorKind::InvalidEntitledFeatures
                | ErrorKind::ServiceUnavailable
                | ErrorKind::Cancelled
                | ErrorKind::DeadlineExceeded
                | ErrorKind::Unknown
        )
    }
}
