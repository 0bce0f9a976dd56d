use clap::Parser;
use neurodoc_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    neurodoc_cli::run(cli).await
}
