use std::path::Path;

use anyhow::{Context, Result};
use sealgate_authz::{load_config, EvaluatorConfig, GateConfig};
use sealgate_evaluator::RemoteConfig;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use super::output::OutputFormat;

/// Crates whose events follow `--log-level`; everything else stays at warn.
const SEALGATE_TARGETS: &[&str] = &[
    "sealgate",
    "sealgate_cli",
    "sealgate_authz",
    "sealgate_evaluator",
    "sealgate_obligations",
];

/// Filter directives used when `RUST_LOG` is not set.
pub fn filter_directives(level: &str, debug: bool) -> Result<String> {
    let level = if debug {
        Level::DEBUG
    } else {
        level
            .parse::<Level>()
            .with_context(|| format!("Invalid log level {level:?}"))?
    };
    let mut directives = vec!["warn".to_string()];
    directives.extend(SEALGATE_TARGETS.iter().map(|target| format!("{target}={level}")));
    Ok(directives.join(","))
}

/// Installs the stderr subscriber. With `--output json` log lines are JSON
/// too, so both streams can be consumed by tooling.
pub fn init_logging(level: &str, debug: bool, output: OutputFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(level, debug)?)
            .context("Invalid log filter")?,
    };
    let registry = tracing_subscriber::registry().with(filter);

    match output {
        OutputFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        OutputFormat::Human => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

/// Loads the gate configuration; an explicit `addr` forces a remote engine
/// at that address.
pub fn load_gate_config(path: Option<&Path>, addr: Option<&str>) -> Result<GateConfig> {
    let mut config = load_config(path).context("Failed to load configuration")?;
    if let Some(addr) = addr {
        match &mut config.evaluator {
            EvaluatorConfig::Remote(remote) => remote.address = addr.to_string(),
            other => {
                *other = EvaluatorConfig::Remote(RemoteConfig {
                    address: addr.to_string(),
                    ..RemoteConfig::default()
                })
            }
        }
    }
    Ok(config)
}

/// Splits a comma-separated argument, dropping blanks.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
