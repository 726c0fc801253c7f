pub mod authorizer;
pub mod claims;
pub mod config;
pub mod decision;
pub mod endpoint;
pub mod errors;
pub mod input;
pub mod jwt;
pub mod prelude;
pub mod queries;

pub use authorizer::{unwrap_result, Authorizer, AuthorizerBuilder};
pub use claims::{ClaimsOutcome, ClaimsVerifier, PassthroughClaims, StructuralClaims};
pub use config::{load_config, load_config_with_options, EvaluatorConfig, GateConfig, LoadOptions};
pub use decision::Decision;
pub use endpoint::{short_endpoint, HttpEndpointModifier};
pub use errors::{AuthzError, ConfigError};
pub use input::{DecisionInputHandler, DefaultDecisionInputHandler};
pub use jwt::{redact_full, redact_signature, JwtMode};
pub use queries::{AcctEntitlements, ServiceFeatures};
