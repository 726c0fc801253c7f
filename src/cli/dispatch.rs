use anyhow::Result;
use sealgate_authz::GateConfig;

use super::entitlements::cmd_acct_entitlements;
use super::env::CliArgs;
use super::health::cmd_health;
use super::validate::cmd_validate;
use crate::cli::commands::Commands;

pub async fn dispatch(cli: &CliArgs, config: GateConfig) -> Result<()> {
    match cli.command.clone() {
        Commands::Validate(args) => cmd_validate(args, config, cli.output).await,
        Commands::AcctEntitlements(args) => cmd_acct_entitlements(args, config, cli.output).await,
        Commands::Health => cmd_health(config, cli.output).await,
    }
}
