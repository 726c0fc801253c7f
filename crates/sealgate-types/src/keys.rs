//! Well-known context keys, metadata names and decision paths.

pub const ABAC_TYPE_KEY: &str = "ABACType";
pub const ABAC_VERB_KEY: &str = "ABACVerb";
pub const OBLIGATIONS_KEY: &str = "obligations";
pub const ENTITLED_FEATURES_KEY: &str = "entitled_features";

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const SET_AUTHORIZATION_HEADER: &str = "set-authorization";

/// Request id placed in the payload when the scope carries none.
pub const NO_REQUEST_ID: &str = "no-request-uuid";

/// Resource class read by the default decision-input handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbacType(pub String);

/// Operation read by the default decision-input handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbacVerb(pub String);

pub mod paths {
    pub const DEFAULT_ADDRESS: &str = "http://localhost:8181";
    pub const VALIDATE_V1: &str = "v1/data/authz/rbac/validate_v1";
    pub const ACCT_ENTITLEMENTS_API: &str = "v1/data/authz/rbac/acct_entitlements_api";
    pub const CURRENT_USER_COMPARTMENTS: &str = "v1/data/authz/rbac/current_user_compartments";
    pub const FILTER_COMPARTMENT_PERMISSIONS_API: &str =
        "v1/data/authz/rbac/filter_compartment_permissions_api";
    pub const FILTER_COMPARTMENT_FEATURES_API: &str =
        "v1/data/authz/rbac/filter_compartment_features_api";
}
