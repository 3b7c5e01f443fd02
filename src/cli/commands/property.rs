use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::config::load_environment_config;
use crate::cli::utils::*;
use crate::cli::{Context, OutputFormat};
use crate::routes::Route;
use crate::types::PropertyPayload;

#[derive(Subcommand)]
pub enum PropertyCommands {
    #[command(about = "List properties")]
    List {
        #[arg(long, help = "Only properties in this portfolio (defaults to the current portfolio)")]
        portfolio: Option<i64>,
        #[arg(long, help = "Ignore the current portfolio and list everything")]
        all: bool,
    },

    #[command(about = "Show one property")]
    Get {
        #[arg(help = "Property ID")]
        id: i64,
    },

    #[command(about = "Create a property from a JSON object (--data or stdin)")]
    Create {
        #[arg(long, help = "Portfolio ID (defaults to the current portfolio)")]
        portfolio: Option<i64>,
        #[arg(long, help = "JSON object with address, city, state, zip, purchase_price, ...")]
        data: Option<String>,
    },

    #[command(about = "Update a property from a JSON object (--data or stdin)")]
    Update {
        #[arg(help = "Property ID")]
        id: i64,
        #[arg(long, help = "JSON object with the fields to change")]
        data: Option<String>,
    },

    #[command(about = "Delete a property")]
    Delete {
        #[arg(help = "Property ID")]
        id: i64,
    },

    #[command(about = "Refresh a property's valuation and rent estimate from RentCast")]
    RefreshRentcast {
        #[arg(help = "Property ID")]
        id: i64,
    },

    #[command(about = "Preview RentCast data for an address")]
    Preview {
        #[arg(help = "Full street address")]
        address: String,
    },
}

pub async fn handle(cmd: PropertyCommands, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Properties)?;
    let output_format = &ctx.output_format;

    match cmd {
        PropertyCommands::List { portfolio, all } => {
            let scope = if all {
                None
            } else {
                resolve_portfolio(portfolio, || Ok(load_environment_config()?.current_portfolio))?
            };
            let page = ctx.resources.properties(scope).list().await?;

            if page.items.is_empty() {
                return output_empty_collection(output_format, "properties", "No properties found");
            }

            match output_format {
                OutputFormat::Json => output_json(&page),
                OutputFormat::Text => {
                    println!(
                        "{:<6} {:<6} {:<30} {:<16} {:>14} {:>12}",
                        "ID", "PORT", "ADDRESS", "CITY", "VALUE", "RENT/MO"
                    );
                    println!("{}", "-".repeat(90));
                    for property in &page.items {
                        println!(
                            "{:<6} {:<6} {:<30} {:<16} {:>14} {:>12}",
                            property.id,
                            property.portfolio_id,
                            truncate(&property.address, 30),
                            truncate(&format!("{}, {}", property.city, property.state), 16),
                            format_money(property.last_valuation),
                            format_money(property.monthly_rent),
                        );
                    }
                    Ok(())
                }
            }
        }
        PropertyCommands::Get { id } => {
            let property = ctx.resources.properties(None).get(id).await?;
            match output_format {
                OutputFormat::Json => output_json(&property),
                OutputFormat::Text => {
                    output_fields(&serde_json::to_value(&property)?);
                    Ok(())
                }
            }
        }
        PropertyCommands::Create { portfolio, data } => {
            let mut fields = read_json_input(data)?;
            if !fields.contains_key("portfolio_id") {
                let portfolio_id =
                    resolve_portfolio(portfolio, || Ok(load_environment_config()?.current_portfolio))?
                        .ok_or_else(|| anyhow::anyhow!("No portfolio given; use --portfolio or `atlas portfolio use <id>`"))?;
                fields.insert("portfolio_id".into(), json!(portfolio_id));
            }

            let payload: PropertyPayload = serde_json::from_value(Value::Object(fields))?;
            let property = ctx.resources.properties(Some(payload.portfolio_id)).create(&payload).await?;
            output_success(
                output_format,
                &format!("Property {} created at {}", property.id, property.address),
                Some(json!({ "property": property })),
            )
        }
        PropertyCommands::Update { id, data } => {
            let fields = read_json_input(data)?;
            let property = ctx.resources.properties(None).update(id, &fields).await?;
            output_success(
                output_format,
                &format!("Property {} updated", property.id),
                Some(json!({ "property": property })),
            )
        }
        PropertyCommands::Delete { id } => {
            ctx.resources.properties(None).delete(id).await?;
            output_success(output_format, &format!("Property {} deleted", id), None)
        }
        PropertyCommands::RefreshRentcast { id } => {
            let property = ctx.resources.properties(None).refresh_rentcast(id).await?;
            output_success(
                output_format,
                &format!(
                    "Property {} valued at {} (confidence {:.2})",
                    property.id,
                    format_money(property.last_valuation),
                    property.rc_confidence
                ),
                Some(json!({ "property": property })),
            )
        }
        PropertyCommands::Preview { address } => {
            let preview = ctx.resources.properties(None).preview_rentcast(&address).await?;
            match output_format {
                OutputFormat::Json => output_json(&preview),
                OutputFormat::Text => {
                    println!("Details");
                    output_fields(&Value::Object(preview.details.clone()));
                    println!();
                    println!("Estimate");
                    output_fields(&Value::Object(preview.estimate.clone()));
                    println!();
                    println!("{} comparable listings", preview.comps.len());
                    Ok(())
                }
            }
        }
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut shortened: String = value.chars().take(width.saturating_sub(1)).collect();
        shortened.push('…');
        shortened
    }
}
