// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Derive, Grant, Init, Open, Pubkey, Redeem, Seal, Version};

command_enum! {
    (Derive, Derive),
    (Grant, Grant),
    (Init, Init),
    (Open, Open),
    (Pubkey, Pubkey),
    (Redeem, Redeem),
    (Seal, Seal),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = keyturn_cli::process::logging_config(args.config_path.as_deref());
    let _guards = keyturn_cli::process::init_logging(&config);

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            drop(_guards);
            std::process::exit(1);
        }
    }
}
