//! Profit projection engine.
//!
//! Every view that shows a receive amount, a profit or a breakeven goes
//! through these functions. Values stay unrounded; rounding belongs to
//! `util::format`.

use thiserror::Error;

use super::entities::{PlatformFeeSchedule, ProfitProjection, TicketSet};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    #[error("breakeven is undefined for fee rate {0}")]
    DivisionUndefined(f64),
}

pub fn net_receive(gross_price: f64, fee_rate: f64) -> f64 {
    gross_price * (1.0 - fee_rate)
}

pub fn profit_per_ticket(net_amount: f64, cost_per_ticket: f64) -> f64 {
    net_amount - cost_per_ticket
}

pub fn aggregate_profit(profit_per_ticket: f64, quantity: u32) -> f64 {
    profit_per_ticket * quantity as f64
}

pub fn breakeven_price(cost_per_ticket: f64, fee_rate: f64) -> Result<f64, ProjectionError> {
    if !fee_rate.is_finite() || fee_rate >= 1.0 {
        return Err(ProjectionError::DivisionUndefined(fee_rate));
    }
    Ok(cost_per_ticket / (1.0 - fee_rate))
}

impl PlatformFeeSchedule {
    pub fn net_receive(&self, gross_price: f64) -> f64 {
        net_receive(gross_price, self.fee_rate())
    }

    /// Infallible: the rate was validated when the schedule was built.
    pub fn breakeven(&self, cost_per_ticket: f64) -> f64 {
        cost_per_ticket / (1.0 - self.fee_rate())
    }
}

/// Keeps only prices the engine can project from.
pub fn usable_price(gross_price: Option<f64>) -> Option<f64> {
    gross_price.filter(|price| price.is_finite() && *price >= 0.0)
}

/// Normalizes a typed price ("$1,250.50", " 700 ") into a gross price.
/// Anything that is not a finite non-negative number means "no price".
pub fn parse_price_input(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    usable_price(cleaned.parse::<f64>().ok())
}

pub fn project_set(
    set: &TicketSet,
    schedule: &PlatformFeeSchedule,
    gross_price: Option<f64>,
) -> Option<ProfitProjection> {
    let gross = usable_price(gross_price)?;
    let net = schedule.net_receive(gross);
    let per_ticket = profit_per_ticket(net, set.cost_per_ticket);
    Some(ProfitProjection {
        net_receive: net,
        profit_per_ticket: per_ticket,
        aggregate_profit: aggregate_profit(per_ticket, set.quantity),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioProjection {
    /// Aligned with the input set order.
    pub per_set: Vec<Option<ProfitProjection>>,
    pub total_cost: f64,
    pub total_profit: f64,
    pub total_tickets: u64,
    pub priced_sets: usize,
}

/// Projects every set under one schedule.
///
/// Cost is counted for every set; a set without a price contributes zero
/// profit rather than being skipped.
pub fn project_portfolio<F>(
    sets: &[TicketSet],
    schedule: &PlatformFeeSchedule,
    price_lookup: F,
) -> PortfolioProjection
where
    F: Fn(&str) -> Option<f64>,
{
    let mut per_set = Vec::with_capacity(sets.len());
    let mut total_cost = 0.0;
    let mut total_profit = 0.0;
    let mut total_tickets = 0_u64;
    let mut priced_sets = 0_usize;

    for set in sets {
        let projection = project_set(set, schedule, price_lookup(&set.name));
        total_cost += set.total_cost();
        total_tickets += u64::from(set.quantity);
        if let Some(projection) = projection.as_ref() {
            total_profit += projection.aggregate_profit;
            priced_sets += 1;
        }
        per_set.push(projection);
    }

    PortfolioProjection {
        per_set,
        total_cost,
        total_profit,
        total_tickets,
        priced_sets,
    }
}
