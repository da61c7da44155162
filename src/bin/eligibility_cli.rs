//! Binary entry point for the developer CLI (SPEC_FULL.md §2 item 12).

use clap::Parser;
use eligibility_engine::cli::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    run(cli).await
}
