use crate::cli::utils::*;
use crate::cli::{Context, OutputFormat};
use crate::routes::Route;

pub async fn handle(ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Dashboard)?;
    let summary = ctx.resources.dashboard().summary().await?;

    match ctx.output_format {
        OutputFormat::Json => output_json(&summary),
        OutputFormat::Text => {
            println!("Net worth:          {}", format_money(summary.total_net_worth));
            println!("Monthly cashflow:   {}", format_money(summary.liquid_cashflow_monthly));
            println!(
                "Holdings:           {} properties, {} stocks",
                summary.property_count, summary.stock_count
            );
            println!();
            println!("Allocation");
            println!("  Properties        {}", format_money(summary.allocation.properties_value));
            println!("  Stocks            {}", format_money(summary.allocation.stocks_value));

            if !summary.timeline.is_empty() {
                println!();
                println!("{:<20} {}", "AS OF", "NET WORTH");
                println!("{}", "-".repeat(36));
                for point in &summary.timeline {
                    println!(
                        "{:<20} {}",
                        point.as_of.format("%Y-%m-%d %H:%M"),
                        format_money(point.net_worth)
                    );
                }
            }
            Ok(())
        }
    }
}
