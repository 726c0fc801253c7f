pub use crate::errors::ObligationsError;
pub use crate::features::{flatten_features, EntitledFeatures};
pub use crate::model::{ObligationsKind, ObligationsNode};
pub use crate::parse::parse_obligations;
pub use crate::sql::{add_outer_parens, compile_sql, ConditionCompiler, PassthroughCompiler};
