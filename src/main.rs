use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use otel_probe::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    // The serve command installs its own subscriber wired into the OTLP
    // pipeline, so only the client commands get plain tracing here.
    let is_serve = matches!(args.get_command(), cli::Commands::Serve);
    if !is_serve {
        init_tracing();
    }

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Serve => {
            commands::serve::execute().await?;
        }
        cli::Commands::Loadgen { url, count } => {
            commands::loadgen::execute(url, count).await?;
        }
        cli::Commands::Verify => {
            commands::verify::execute().await?;
        }
        cli::Commands::Version => {
            println!("otel-probe v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
