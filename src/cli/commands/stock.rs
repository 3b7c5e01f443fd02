use clap::Subcommand;
use serde_json::json;

use crate::cli::config::load_environment_config;
use crate::cli::utils::*;
use crate::cli::{Context, OutputFormat};
use crate::routes::Route;
use crate::types::StockPayload;

#[derive(Subcommand)]
pub enum StockCommands {
    #[command(about = "List stock holdings")]
    List {
        #[arg(long, help = "Only holdings in this portfolio (defaults to the current portfolio)")]
        portfolio: Option<i64>,
        #[arg(long, help = "Ignore the current portfolio and list everything")]
        all: bool,
    },

    #[command(about = "Show one holding")]
    Get {
        #[arg(help = "Holding ID")]
        id: i64,
    },

    #[command(about = "Record a stock position")]
    Create {
        #[arg(help = "Ticker symbol")]
        symbol: String,
        #[arg(help = "Number of shares")]
        shares: f64,
        #[arg(long, help = "Portfolio ID (defaults to the current portfolio)")]
        portfolio: Option<i64>,
        #[arg(long, help = "Average cost per share")]
        average_cost: Option<f64>,
        #[arg(long, help = "Last known price per share")]
        last_price: Option<f64>,
        #[arg(long, help = "Free-form notes")]
        notes: Option<String>,
    },

    #[command(about = "Update a holding from a JSON object (--data or stdin)")]
    Update {
        #[arg(help = "Holding ID")]
        id: i64,
        #[arg(long, help = "JSON object with the fields to change")]
        data: Option<String>,
    },

    #[command(about = "Delete a holding")]
    Delete {
        #[arg(help = "Holding ID")]
        id: i64,
    },
}

pub async fn handle(cmd: StockCommands, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Stocks)?;
    let output_format = &ctx.output_format;

    match cmd {
        StockCommands::List { portfolio, all } => {
            let scope = if all {
                None
            } else {
                resolve_portfolio(portfolio, || Ok(load_environment_config()?.current_portfolio))?
            };
            let page = ctx.resources.stocks(scope).list().await?;

            if page.items.is_empty() {
                return output_empty_collection(output_format, "stocks", "No stock holdings found");
            }

            match output_format {
                OutputFormat::Json => output_json(&page),
                OutputFormat::Text => {
                    println!(
                        "{:<6} {:<6} {:<8} {:>12} {:>12} {:>12} {:>14}",
                        "ID", "PORT", "SYMBOL", "SHARES", "AVG COST", "LAST", "VALUE"
                    );
                    println!("{}", "-".repeat(76));
                    for holding in &page.items {
                        println!(
                            "{:<6} {:<6} {:<8} {:>12.4} {:>12} {:>12} {:>14}",
                            holding.id,
                            holding.portfolio_id,
                            holding.symbol,
                            holding.shares,
                            format_money(holding.average_cost),
                            format_money(holding.last_price),
                            format_money(holding.market_value()),
                        );
                    }
                    Ok(())
                }
            }
        }
        StockCommands::Get { id } => {
            let holding = ctx.resources.stocks(None).get(id).await?;
            match output_format {
                OutputFormat::Json => output_json(&holding),
                OutputFormat::Text => {
                    output_fields(&serde_json::to_value(&holding)?);
                    Ok(())
                }
            }
        }
        StockCommands::Create {
            symbol,
            shares,
            portfolio,
            average_cost,
            last_price,
            notes,
        } => {
            let portfolio_id =
                resolve_portfolio(portfolio, || Ok(load_environment_config()?.current_portfolio))?
                    .ok_or_else(|| anyhow::anyhow!("No portfolio given; use --portfolio or `atlas portfolio use <id>`"))?;

            let payload = StockPayload {
                portfolio_id,
                symbol: symbol.to_uppercase(),
                shares,
                average_cost,
                last_price,
                notes,
            };
            let holding = ctx.resources.stocks(Some(portfolio_id)).create(&payload).await?;
            output_success(
                output_format,
                &format!("Recorded {} {} (id {})", holding.shares, holding.symbol, holding.id),
                Some(json!({ "stock": holding })),
            )
        }
        StockCommands::Update { id, data } => {
            let fields = read_json_input(data)?;
            let holding = ctx.resources.stocks(None).update(id, &fields).await?;
            output_success(
                output_format,
                &format!("Holding {} updated", holding.id),
                Some(json!({ "stock": holding })),
            )
        }
        StockCommands::Delete { id } => {
            ctx.resources.stocks(None).delete(id).await?;
            output_success(output_format, &format!("Holding {} deleted", id), None)
        }
    }
}
