pub mod bundle;
pub mod config;
pub mod engine;
pub mod evaluator;

pub use bundle::{Bundle, BundleSource};
pub use config::{EmbeddedConfig, PollingConfig};
pub use engine::rule_path;
pub use evaluator::{EmbeddedEvaluator, ReloadStatus};
