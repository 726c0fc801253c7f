use clap::Subcommand;

use super::entitlements::AcctEntitlementsArgs;
use super::validate::ValidateArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the decision pipeline for one request
    Validate(ValidateArgs),

    /// Show the features each account is entitled to
    #[command(name = "acct_entitlements")]
    AcctEntitlements(AcctEntitlementsArgs),

    /// Probe the policy engine
    Health,
}
