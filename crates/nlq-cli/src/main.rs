//! NL2SQL orchestrator CLI and HTTP front end.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod http;
mod orchestrate;
mod wiring;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result: Result<()> = match &cli.command {
        cli::Commands::Ask(args) => commands::ask::execute(args, &cli.global).await,
        cli::Commands::Serve(args) => commands::serve::execute(args, &cli.global).await,
    };

    if let Err(err) = result {
        if let Some(exit_code) = err.downcast_ref::<commands::common::ExitCode>() {
            std::process::exit(exit_code.0);
        }
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
