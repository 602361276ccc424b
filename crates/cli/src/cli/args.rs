pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keyturn")]
#[command(version)]
#[command(about = "Grant, redeem and rotate group secrets for registry-backed projects")]
pub struct Args {
    /// Path to the keyturn state directory (defaults to ~/.keyturn)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
