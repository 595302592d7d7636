use anyhow::Result;
use colored::Colorize;
use otel_probe::{config, pipeline, readiness};
use reqwest::Client;

/// Execute the verify command
///
/// This will:
/// 1. Wait for every stack dependency to become ready
/// 2. Send the sample traffic through the demo service
/// 3. Wait for traces, metrics and logs to show up in their stores
pub async fn execute() -> Result<()> {
    let cfg = config::load_config()?;
    let client = Client::new();

    println!("{}", "Checking stack readiness...".yellow());
    readiness::wait_for_stack_ready(&client, &cfg).await?;

    println!("{}", "Sending sample traffic...".yellow());
    pipeline::exercise_application(&client, &cfg).await?;

    println!("{}", "Waiting for signal ingestion...".yellow());
    pipeline::wait_for_ingestion(&client, &cfg).await?;

    println!("{}", "✓ Observability pipeline verified".green());

    Ok(())
}
