use anyhow::Result;
use colored::Colorize;
use otel_probe::{config, server};

/// Execute the serve command
///
/// This will:
/// 1. Load configuration
/// 2. Start the demo service (blocks until shutdown)
pub async fn execute() -> Result<()> {
    println!("{}", "Starting demo service...".green());

    let cfg = config::load_config()?;
    server::start_server(cfg).await?;

    Ok(())
}
