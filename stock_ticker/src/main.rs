use anyhow::{Context, Result};
use clap::Parser;
use stock_ticker::{
    app,
    config::{Cli, Settings},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(&cli).context("invalid configuration")?;
    telemetry::init(settings.log_format)?;

    app::run(settings).await
}
