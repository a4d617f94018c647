use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden_cli::{WardenCli, run};

#[tokio::main]
pub async fn main() -> Result<()> {
    let cli = WardenCli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = run(cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
