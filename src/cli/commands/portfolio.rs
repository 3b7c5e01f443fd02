use clap::Subcommand;
use serde_json::json;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::{Context, OutputFormat};
use crate::routes::Route;
use crate::types::PortfolioUpdate;

#[derive(Subcommand)]
pub enum PortfolioCommands {
    #[command(about = "List portfolios")]
    List,

    #[command(about = "Show one portfolio")]
    Get {
        #[arg(help = "Portfolio ID")]
        id: i64,
    },

    #[command(about = "Create a portfolio")]
    Create {
        #[arg(help = "Portfolio name")]
        name: String,
    },

    #[command(about = "Rename a portfolio")]
    Rename {
        #[arg(help = "Portfolio ID")]
        id: i64,
        #[arg(help = "New name")]
        name: String,
    },

    #[command(about = "Delete a portfolio")]
    Delete {
        #[arg(help = "Portfolio ID")]
        id: i64,
    },

    #[command(about = "Use a portfolio as the default for property and stock commands")]
    Use {
        #[arg(help = "Portfolio ID")]
        id: i64,
    },

    #[command(about = "Show the default portfolio")]
    Current,
}

pub async fn handle(cmd: PortfolioCommands, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Portfolios)?;
    let output_format = &ctx.output_format;
    let portfolios = ctx.resources.portfolios();

    match cmd {
        PortfolioCommands::List => {
            let page = portfolios.list().await?;
            let env_config = load_environment_config()?;

            if page.items.is_empty() {
                return output_empty_collection(output_format, "portfolios", "No portfolios yet");
            }

            match output_format {
                OutputFormat::Json => output_json(&page),
                OutputFormat::Text => {
                    println!("{:<8} {}", "ID", "NAME");
                    println!("{}", "-".repeat(40));
                    for portfolio in &page.items {
                        let marker = if env_config.current_portfolio == Some(portfolio.id) { "*" } else { " " };
                        println!("{}{:<7} {}", marker, portfolio.id, portfolio.name);
                    }
                    if page.total > page.items.len() as i64 {
                        println!("({} of {} shown)", page.items.len(), page.total);
                    }
                    Ok(())
                }
            }
        }
        PortfolioCommands::Get { id } => {
            let portfolio = portfolios.get(id).await?;
            match output_format {
                OutputFormat::Json => output_json(&portfolio),
                OutputFormat::Text => {
                    output_fields(&serde_json::to_value(&portfolio)?);
                    Ok(())
                }
            }
        }
        PortfolioCommands::Create { name } => {
            let portfolio = portfolios.create(&name).await?;
            output_success(
                output_format,
                &format!("Portfolio '{}' created (id {})", portfolio.name, portfolio.id),
                Some(json!({ "portfolio": portfolio })),
            )
        }
        PortfolioCommands::Rename { id, name } => {
            let update = PortfolioUpdate { name: Some(name) };
            let portfolio = portfolios.update(id, &update).await?;
            output_success(
                output_format,
                &format!("Portfolio {} renamed to '{}'", portfolio.id, portfolio.name),
                Some(json!({ "portfolio": portfolio })),
            )
        }
        PortfolioCommands::Delete { id } => {
            portfolios.delete(id).await?;
            update_environment_config(|env| {
                if env.current_portfolio == Some(id) {
                    env.current_portfolio = None;
                }
            })?;
            output_success(output_format, &format!("Portfolio {} deleted", id), None)
        }
        PortfolioCommands::Use { id } => {
            // Fails with the server's message when the portfolio is not ours
            let portfolio = portfolios.get(id).await?;
            update_environment_config(|env| env.current_portfolio = Some(portfolio.id))?;
            output_success(
                output_format,
                &format!("Switched to portfolio '{}' ({})", portfolio.name, portfolio.id),
                Some(json!({ "current_portfolio": portfolio.id })),
            )
        }
        PortfolioCommands::Current => {
            let env_config = load_environment_config()?;
            match env_config.current_portfolio {
                Some(id) => {
                    let portfolio = portfolios.get(id).await?;
                    match output_format {
                        OutputFormat::Json => output_json(&json!({ "current_portfolio": portfolio })),
                        OutputFormat::Text => {
                            println!("Current portfolio: {} ({})", portfolio.name, portfolio.id);
                            Ok(())
                        }
                    }
                }
                None => match output_format {
                    OutputFormat::Json => output_json(&json!({ "current_portfolio": null })),
                    OutputFormat::Text => {
                        println!("No current portfolio set");
                        Ok(())
                    }
                },
            }
        }
    }
}
