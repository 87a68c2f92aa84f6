use clap::Parser;

use llm_balance::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    cli::run(cli).await?;
    Ok(())
}
