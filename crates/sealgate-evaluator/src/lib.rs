pub mod embedded;
pub mod errors;
pub mod evaluator;
pub mod prelude;
pub mod remote;

pub use embedded::{EmbeddedConfig, EmbeddedEvaluator, PollingConfig, ReloadStatus};
pub use errors::EvalError;
pub use evaluator::Evaluator;
pub use remote::{RemoteConfig, RemoteEvaluator, RemoteEvaluatorBuilder};
