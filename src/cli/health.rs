use anyhow::Result;
use sealgate_authz::{EvaluatorConfig, GateConfig};
use sealgate_evaluator::EmbeddedEvaluator;
use serde_json::json;

use super::output::{print_json, OutputFormat};

pub async fn cmd_health(config: GateConfig, output: OutputFormat) -> Result<()> {
    let (report, summary) = match &config.evaluator {
        EvaluatorConfig::Remote(remote) => {
            let evaluator = remote.build()?;
            evaluator.health().await?;
            (
                json!({ "evaluator": "remote", "address": evaluator.address(), "healthy": true }),
                format!("Engine at {} is healthy", evaluator.address()),
            )
        }
        EvaluatorConfig::Embedded(embedded) => {
            let evaluator = EmbeddedEvaluator::start(embedded.clone()).await?;
            let revision = evaluator.revision();
            evaluator.shutdown().await;
            (
                json!({
                    "evaluator": "embedded",
                    "bundle_url": embedded.bundle_url,
                    "revision": revision,
                    "healthy": true,
                }),
                format!(
                    "Embedded bundle {} loaded (revision {})",
                    embedded.bundle_url, revision
                ),
            )
        }
    };

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Human => println!("{summary}"),
    }
    Ok(())
}
