use anyhow::Result;
use colored::Colorize;
use otel_probe::{config, loadgen};

/// Execute the loadgen command
///
/// This will:
/// 1. Load configuration and apply the CLI overrides
/// 2. Run the traffic loop until `count` requests, or Ctrl-C
pub async fn execute(url: Option<String>, count: Option<u64>) -> Result<()> {
    let mut cfg = config::load_config()?;
    if let Some(url) = url {
        cfg.loadgen.target_base_url = url;
    }

    println!(
        "{}",
        format!("Generating load against {}...", cfg.loadgen.target_base_url).green()
    );

    loadgen::run(&cfg.loadgen, count).await?;

    Ok(())
}
