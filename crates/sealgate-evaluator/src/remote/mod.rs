pub mod client;
pub mod config;
pub mod headers;
mod wire;

pub use client::{RemoteEvaluator, RemoteEvaluatorBuilder};
pub use config::RemoteConfig;
pub use headers::forward_metadata;
