use clap::Parser;
use atlas_client::cli::Cli;
use atlas_client::config::config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so ATLAS_API_BASE_URL etc. can live next to the project
    let _ = dotenvy::dotenv();

    let app_config = config();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app_config.logging.directives()));

    // stdout carries command output (possibly JSON), so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if atlas_client::is_development!() {
        tracing::debug!("Atlas CLI in {:?} mode against {}", app_config.environment, app_config.api.base_url);
    }

    let cli = Cli::parse();

    if let Err(e) = atlas_client::cli::run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
