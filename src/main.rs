use std::process::ExitCode;

use tabled::{settings::Style, Table, Tabled};
use time::format_description::well_known::Rfc3339;

use ticket_value_scanner::domain::analytics::REVENUE_BAND;
use ticket_value_scanner::domain::{history, DashboardState, PortfolioComparison};
use ticket_value_scanner::infra::{ApiClientError, CacheStatus, InventoryClient};
use ticket_value_scanner::util::format::{
    format_cents, format_currency, format_optional, format_pct, format_signed, PLACEHOLDER,
};
use ticket_value_scanner::util::logging::LoggingConfig;
use ticket_value_scanner::util::persistence::{load_settings, Settings};

#[derive(Tabled)]
struct SetRow {
    #[tabled(rename = "Set")]
    name: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Cost/ticket")]
    cost: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Best")]
    best: String,
    #[tabled(rename = "You receive")]
    receive: String,
    #[tabled(rename = "Profit/ticket")]
    profit_per_ticket: String,
    #[tabled(rename = "Total profit")]
    total_profit: String,
    #[tabled(rename = "Breakeven")]
    breakeven: String,
}

#[derive(Tabled)]
struct PlatformRow {
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Net revenue")]
    revenue: String,
    #[tabled(rename = "Profit")]
    profit: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Settings pick the real subscriber; until then the loader logs at the default level.
    let loaded =
        tracing::subscriber::with_default(LoggingConfig::default().subscriber(), load_settings);
    let settings = match loaded {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("invalid settings: {error}");
            return ExitCode::FAILURE;
        }
    };
    settings.logging.init();

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "report failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), ApiClientError> {
    let client = InventoryClient::with_base_url(&settings.backend_url)?.with_ttl(settings.cache_ttl);
    println!("Backend: {}", client.base_url());
    let inventory = client.get_inventory().await?;
    if inventory.status == CacheStatus::Stale {
        tracing::warn!("showing stale inventory");
    }

    let mut state = DashboardState::new(settings.platforms.clone());
    state.apply_inventory(inventory.data, inventory.fetched_at);

    let comparison = state.comparison();
    println!("{}", set_table(&state, &comparison));
    println!("{}", platform_table(&comparison));
    println!(
        "Tickets: {}  Total cost: {}",
        comparison.total_tickets,
        format_currency(comparison.total_cost)
    );
    if let Some(best) = comparison.best_overall.as_deref() {
        println!("Best overall: {best}");
    }

    if let Some(schedule) = state.schedules.first() {
        let analytics = state.analytics(schedule);
        if let Some(profit) = analytics.projected_profit {
            println!(
                "Projected profit on {} (±{:.0}%): {} / {} / {}",
                schedule.name(),
                REVENUE_BAND * 100.0,
                format_signed(profit.min),
                format_signed(profit.avg),
                format_signed(profit.max)
            );
        }
        for item in analytics.items.iter().filter(|item| item.profit_margin_pct.is_some()) {
            println!("  {} margin {}", item.set_name, format_pct(item.profit_margin_pct));
        }
    }

    match client.get_latest_snapshots().await {
        Ok(snapshots) => {
            if let Some(updated) = history::last_updated(&snapshots) {
                let label = updated.format(&Rfc3339).unwrap_or_else(|_| updated.to_string());
                println!("Last price snapshot: {label}");
            }
        }
        Err(error) => tracing::warn!(%error, "price history unavailable"),
    }

    Ok(())
}

fn set_table(state: &DashboardState, comparison: &PortfolioComparison) -> String {
    let rows = state
        .entries
        .iter()
        .zip(comparison.sets.iter())
        .map(|(entry, row)| {
            let headline = row.headline();
            let projection = headline.and_then(|p| p.projection);
            let breakeven = headline.map(|p| p.breakeven);

            SetRow {
                name: entry.set.name.clone(),
                date: entry.set.event_date.clone(),
                section: entry.set.section.clone(),
                quantity: entry.set.quantity,
                cost: format_cents(entry.set.cost_per_ticket),
                price: format_optional(row.gross_price, format_currency),
                best: row.best_platform.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
                receive: format_optional(projection.map(|p| p.net_receive), format_currency),
                profit_per_ticket: format_optional(
                    projection.map(|p| p.profit_per_ticket),
                    format_signed,
                ),
                total_profit: format_optional(projection.map(|p| p.aggregate_profit), format_signed),
                breakeven: format_optional(breakeven, format_cents),
            }
        })
        .collect::<Vec<_>>();

    Table::new(rows).with(Style::rounded()).to_string()
}

fn platform_table(comparison: &PortfolioComparison) -> String {
    let rows = comparison
        .platforms
        .iter()
        .map(|totals| PlatformRow {
            platform: totals.platform.clone(),
            revenue: format_currency(totals.net_revenue),
            profit: format_signed(totals.total_profit),
        })
        .collect::<Vec<_>>();

    Table::new(rows).with(Style::rounded()).to_string()
}
