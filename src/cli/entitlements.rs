use anyhow::Result;
use clap::Args;
use sealgate_authz::GateConfig;
use sealgate_types::prelude::RequestScope;

use super::output::{print_json, OutputFormat};
use super::runtime::split_csv;

#[derive(Args, Clone, Debug)]
pub struct AcctEntitlementsArgs {
    /// Comma-separated account ids
    pub acct_ids: String,
    /// Comma-separated service names
    pub services: String,
}

pub async fn cmd_acct_entitlements(
    args: AcctEntitlementsArgs,
    config: GateConfig,
    output: OutputFormat,
) -> Result<()> {
    let authz = config.build_authorizer().await?;
    let entitlements = authz
        .acct_entitlements(
            &RequestScope::new(),
            &split_csv(&args.acct_ids),
            &split_csv(&args.services),
        )
        .await?;

    match output {
        OutputFormat::Json => print_json(&entitlements)?,
        OutputFormat::Human => {
            if entitlements.is_empty() {
                println!("no entitlements");
            }
            for (acct, services) in &entitlements {
                println!("{acct}:");
                for (service, features) in services {
                    println!("  {service}: {}", features.join(", "));
                }
            }
        }
    }
    Ok(())
}
