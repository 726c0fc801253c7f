pub mod errors;
pub mod features;
pub mod model;
pub mod parse;
pub mod prelude;
pub mod sql;

pub use errors::ObligationsError;
pub use features::{flatten_features, EntitledFeatures};
pub use model::{ObligationsKind, ObligationsNode};
pub use parse::parse_obligations;
pub use sql::{add_outer_parens, compile_sql, ConditionCompiler, PassthroughCompiler};
