//! Side-by-side projections across resale platforms.

use super::entities::{PlatformFeeSchedule, ProfitProjection, TicketSet};
use super::projection::project_set;

#[derive(Clone, Debug, PartialEq)]
pub struct PlatformProjection {
    pub platform: String,
    pub fee_rate: f64,
    pub breakeven: f64,
    pub projection: Option<ProfitProjection>,
}

/// Projects one gross price under every schedule, in schedule order.
pub fn project_platforms(
    set: &TicketSet,
    schedules: &[PlatformFeeSchedule],
    gross_price: Option<f64>,
) -> Vec<PlatformProjection> {
    schedules
        .iter()
        .map(|schedule| PlatformProjection {
            platform: schedule.name().to_string(),
            fee_rate: schedule.fee_rate(),
            breakeven: schedule.breakeven(set.cost_per_ticket),
            projection: project_set(set, schedule, gross_price),
        })
        .collect()
}

/// Platform with the strictly highest net receive. Equal values keep the
/// earlier entry, so the first configured platform wins a tie.
pub fn best_platform(projections: &[PlatformProjection]) -> Option<&PlatformProjection> {
    let mut best: Option<(&PlatformProjection, f64)> = None;
    for candidate in projections {
        let Some(projection) = candidate.projection.as_ref() else {
            continue;
        };
        match best {
            Some((_, net)) if projection.net_receive <= net => {}
            _ => best = Some((candidate, projection.net_receive)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetComparison {
    pub set_name: String,
    pub gross_price: Option<f64>,
    pub platforms: Vec<PlatformProjection>,
    pub best_platform: Option<String>,
}

impl SetComparison {
    /// The platform a one-line summary of this set should quote: the best
    /// one when priced, otherwise the first configured.
    pub fn headline(&self) -> Option<&PlatformProjection> {
        self.best_platform
            .as_deref()
            .and_then(|name| self.platforms.iter().find(|p| p.platform == name))
            .or_else(|| self.platforms.first())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlatformTotals {
    pub platform: String,
    /// Net proceeds over priced sets only.
    pub net_revenue: f64,
    pub total_profit: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortfolioComparison {
    pub sets: Vec<SetComparison>,
    pub platforms: Vec<PlatformTotals>,
    pub total_cost: f64,
    pub total_tickets: u64,
    pub best_overall: Option<String>,
}

pub fn compare_portfolio<F>(
    sets: &[TicketSet],
    schedules: &[PlatformFeeSchedule],
    price_lookup: F,
) -> PortfolioComparison
where
    F: Fn(&str) -> Option<f64>,
{
    let mut totals: Vec<PlatformTotals> = schedules
        .iter()
        .map(|schedule| PlatformTotals {
            platform: schedule.name().to_string(),
            net_revenue: 0.0,
            total_profit: 0.0,
        })
        .collect();
    let mut rows = Vec::with_capacity(sets.len());
    let mut total_cost = 0.0;
    let mut total_tickets = 0_u64;

    for set in sets {
        let gross_price = price_lookup(&set.name);
        let platforms = project_platforms(set, schedules, gross_price);

        for (total, platform) in totals.iter_mut().zip(platforms.iter()) {
            if let Some(projection) = platform.projection.as_ref() {
                total.net_revenue += projection.net_receive * set.quantity as f64;
                total.total_profit += projection.aggregate_profit;
            }
        }

        total_cost += set.total_cost();
        total_tickets += u64::from(set.quantity);
        rows.push(SetComparison {
            set_name: set.name.clone(),
            gross_price,
            best_platform: best_platform(&platforms).map(|best| best.platform.clone()),
            platforms,
        });
    }

    let any_priced = rows
        .iter()
        .any(|row| row.platforms.iter().any(|p| p.projection.is_some()));
    let best_overall = if any_priced {
        best_by_profit(&totals).map(|totals| totals.platform.clone())
    } else {
        None
    };

    PortfolioComparison {
        sets: rows,
        platforms: totals,
        total_cost,
        total_tickets,
        best_overall,
    }
}

fn best_by_profit(totals: &[PlatformTotals]) -> Option<&PlatformTotals> {
    totals.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.total_profit <= current.total_profit => Some(current),
        _ => Some(candidate),
    })
}
