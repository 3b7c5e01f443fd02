pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::AuthController;
use crate::error::ClientError;
use crate::resources::Resources;
use crate::routes::{self, Navigation, Route};
use crate::session::{FileStorage, Session};

#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Atlas CLI - track portfolios, properties and stocks")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, registration and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Show net worth, cashflow and allocation")]
    Dashboard,

    #[command(about = "Manage portfolios")]
    Portfolio {
        #[command(subcommand)]
        cmd: commands::portfolio::PortfolioCommands,
    },

    #[command(about = "Manage real-estate properties")]
    Property {
        #[command(subcommand)]
        cmd: commands::property::PropertyCommands,
    },

    #[command(about = "Manage stock holdings")]
    Stock {
        #[command(subcommand)]
        cmd: commands::stock::StockCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Everything a command needs: the bootstrapped session and the resources
pub struct Context {
    pub auth: AuthController,
    pub resources: Resources,
    pub output_format: OutputFormat,
}

impl Context {
    pub async fn connect(output_format: OutputFormat) -> anyhow::Result<Self> {
        let app_config = crate::config::config();
        let storage = Arc::new(FileStorage::new(config::session_file()?));
        let session = Arc::new(Session::new(storage));
        let client = ApiClient::new(&app_config.api, session)?;

        let auth = AuthController::new(client.clone());
        auth.bootstrap().await;

        Ok(Self {
            auth,
            resources: Resources::new(client),
            output_format,
        })
    }

    /// Fail early when `route` would send the user to the login page
    pub fn require(&self, route: Route) -> anyhow::Result<()> {
        match routes::resolve(route, &self.auth.state()) {
            Navigation::Redirect(Route::Login) => Err(anyhow::anyhow!(
                "Not logged in. Run `atlas auth login <email>` first"
            )),
            Navigation::Loading => Err(anyhow::anyhow!("Session is still loading")),
            Navigation::Render(_) | Navigation::Redirect(_) => Ok(()),
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = Context::connect(output_format).await?;

    let result = match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx).await,
        Commands::Dashboard => commands::dashboard::handle(&ctx).await,
        Commands::Portfolio { cmd } => commands::portfolio::handle(cmd, &ctx).await,
        Commands::Property { cmd } => commands::property::handle(cmd, &ctx).await,
        Commands::Stock { cmd } => commands::stock::handle(cmd, &ctx).await,
    };

    // A 401 that survived the token refresh
    result.map_err(|e| {
        let expired = matches!(
            e.downcast_ref::<ClientError>(),
            Some(ClientError::Unauthorized { .. })
        );
        if expired {
            e.context("Session expired. Run `atlas auth login <email>` to sign in again")
        } else {
            e
        }
    })
}
