use clap::Parser;
use logweave::app;
use logweave::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    app::init_tracing(cli.debug)?;
    app::run(cli).await
}
