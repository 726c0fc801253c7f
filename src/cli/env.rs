use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Policy engine address [default: http://localhost:8181]
    #[arg(value_name = "ADDR")]
    pub addr: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, default_value = "human", global = true)]
    pub output: crate::cli::output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}
