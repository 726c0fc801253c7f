pub use crate::embedded::{
    Bundle, BundleSource, EmbeddedConfig, EmbeddedEvaluator, PollingConfig, ReloadStatus,
};
pub use crate::errors::EvalError;
pub use crate::evaluator::Evaluator;
pub use crate::remote::{forward_metadata, RemoteConfig, RemoteEvaluator, RemoteEvaluatorBuilder};
