pub use crate::{
    code::{codes, spec_of, CodeSpec, ErrorCode, REGISTRY},
    disposition::Disposition,
    kind::ErrorKind,
    model::{ErrorBuilder, ErrorObj},
    render::{AuditErrorView, PublicErrorView},
};
