pub use crate::authorizer::{unwrap_result, Authorizer, AuthorizerBuilder};
pub use crate::claims::{ClaimsOutcome, ClaimsVerifier, PassthroughClaims, StructuralClaims};
pub use crate::config::{
    load_config, load_config_with_options, EvaluatorConfig, GateConfig, LoadOptions,
};
pub use crate::decision::Decision;
pub use crate::endpoint::{short_endpoint, HttpEndpointModifier};
pub use crate::errors::{AuthzError, ConfigError};
pub use crate::input::{DecisionInputHandler, DefaultDecisionInputHandler};
pub use crate::jwt::{redact_full, redact_signature, JwtMode};
pub use crate::queries::{AcctEntitlements, ServiceFeatures};
