//! # formwork CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// formwork: declarative form schemas.
///
/// Decodes and validates JSON/YAML documents against forms declared in a
/// schema document.
#[derive(Parser, Debug)]
#[command(name = "formwork", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Decode a document with a form and print the encoded result.
    Check(formwork_cli::check::CheckArgs),
    /// List the forms declared in a schema document.
    Forms(formwork_cli::forms::FormsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Check(args) => formwork_cli::check::run(&args),
        Commands::Forms(args) => formwork_cli::forms::run(&args),
    }
}
