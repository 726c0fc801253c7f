pub mod app;
pub mod commands;
pub mod dispatch;
pub mod entitlements;
pub mod env;
pub mod health;
pub mod output;
pub mod runtime;
pub mod validate;

pub use entitlements::{cmd_acct_entitlements, AcctEntitlementsArgs};
pub use health::cmd_health;
pub use validate::{cmd_validate, ValidateArgs};
