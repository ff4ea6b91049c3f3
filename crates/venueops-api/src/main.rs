use anyhow::Context;
use clap::Parser;
use tracing::info;
use venueops_api::cli::{Cli, Commands};
use venueops_api::config::Config;
use venueops_api::observability::init_logging;
use venueops_api::server;
use venueops_core::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_logging(config.log_format);

    match cli.command() {
        Commands::Serve => server::serve(config).await,
        Commands::Migrate => {
            let pool = db::establish_connection(&config.database_url)
                .await
                .with_context(|| format!("failed to migrate {}", config.database_url))?;
            pool.close().await;
            info!(database_url = %config.database_url, "migrations applied");
            Ok(())
        }
    }
}
