//! CLI argument definitions using clap derive API.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nlq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the config file (default: ./nlq.yml, falling back to built-in defaults).
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single natural-language question and print the result.
    Ask(AskArgs),

    /// Run the HTTP front end, exposing the same pipeline as a JSON API.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The natural-language question.
    pub question: String,

    /// Which database to answer against.
    #[arg(long, default_value = "default")]
    pub database: String,

    /// Include the full pipeline trace (context, link bundle, join plan,
    /// every candidate considered) in the printed output.
    #[arg(long)]
    pub trace: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP front end to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub addr: String,
}
