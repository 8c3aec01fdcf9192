use super::entities::{PlatformFeeSchedule, TicketSet};
use super::projection::{project_set, usable_price};

/// Spread applied around the expected revenue to form a low/high band.
pub const REVENUE_BAND: f64 = 0.20;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetRevenue {
    pub set_name: String,
    pub section: String,
    pub quantity: u32,
    pub cost_basis: f64,
    pub expected_price: Option<f64>,
    pub expected_revenue: Option<f64>,
    pub expected_profit: Option<f64>,
    pub profit_margin_pct: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RevenueAnalytics {
    pub total_tickets: u64,
    pub total_cost_basis: f64,
    /// Net revenue band over sets with an expected price.
    pub expected_revenue: Option<Band>,
    pub projected_profit: Option<Band>,
    pub items: Vec<SetRevenue>,
}

/// Expected price for a set: the looked-up market or manual price, else the
/// midpoint of the set's target range.
pub fn expected_price(set: &TicketSet, looked_up: Option<f64>) -> Option<f64> {
    usable_price(looked_up).or_else(|| usable_price(set.target_midpoint()))
}

pub fn revenue_analytics<F>(
    sets: &[TicketSet],
    schedule: &PlatformFeeSchedule,
    price_lookup: F,
) -> RevenueAnalytics
where
    F: Fn(&str) -> Option<f64>,
{
    let mut items = Vec::with_capacity(sets.len());
    let mut total_tickets = 0_u64;
    let mut total_cost_basis = 0.0;
    let mut priced_revenue = 0.0;
    let mut priced_cost = 0.0;
    let mut any_priced = false;

    for set in sets {
        let cost_basis = set.total_cost();
        total_tickets += u64::from(set.quantity);
        total_cost_basis += cost_basis;

        let price = expected_price(set, price_lookup(&set.name));
        let projection = project_set(set, schedule, price);
        let expected_revenue = projection.map(|p| p.net_receive * set.quantity as f64);
        let expected_profit = projection.map(|p| p.aggregate_profit);

        if let Some(revenue) = expected_revenue {
            any_priced = true;
            priced_revenue += revenue;
            priced_cost += cost_basis;
        }

        items.push(SetRevenue {
            set_name: set.name.clone(),
            section: set.section.clone(),
            quantity: set.quantity,
            cost_basis,
            expected_price: price,
            expected_revenue,
            expected_profit,
            profit_margin_pct: expected_profit.and_then(|profit| margin_pct(profit, cost_basis)),
        });
    }

    let expected_revenue = any_priced.then(|| Band {
        min: priced_revenue * (1.0 - REVENUE_BAND),
        avg: priced_revenue,
        max: priced_revenue * (1.0 + REVENUE_BAND),
    });
    let projected_profit = expected_revenue.map(|band| Band {
        min: band.min - priced_cost,
        avg: band.avg - priced_cost,
        max: band.max - priced_cost,
    });

    RevenueAnalytics {
        total_tickets,
        total_cost_basis,
        expected_revenue,
        projected_profit,
        items,
    }
}

pub fn margin_pct(profit: f64, cost_basis: f64) -> Option<f64> {
    (cost_basis > 0.0).then(|| profit / cost_basis * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn zero_fee() -> PlatformFeeSchedule {
        PlatformFeeSchedule::new("Direct", 0.0).unwrap()
    }

    #[test]
    fn falls_back_to_target_midpoint() {
        let sets = vec![
            TicketSet::new("Set A", "Aug 28", "200s Row 1", 4, 400.0),
            TicketSet::new("Set B", "Sept 19", "Left GA", 2, 300.0).with_target_range(350.0, 450.0),
            TicketSet::new("Set C", "Sept 18", "Section 112", 8, 324.88),
        ];
        let analytics = revenue_analytics(&sets, &zero_fee(), |name| {
            (name == "Set A").then_some(500.0)
        });

        assert_eq!(analytics.total_tickets, 14);

        let bulk = vec![
            TicketSet::new("Bulk", "Aug 28", "Floor", u32::MAX, 1.0),
            sets[0].clone(),
        ];
        let large = revenue_analytics(&bulk, &zero_fee(), |_| None);
        assert_eq!(large.total_tickets, u64::from(u32::MAX) + 4);
        assert!((analytics.total_cost_basis - (1600.0 + 600.0 + 8.0 * 324.88)).abs() < EPS);

        let b = &analytics.items[1];
        assert_eq!(b.expected_price, Some(400.0));
        assert_eq!(b.expected_profit, Some(200.0));
        assert!(analytics.items[2].expected_revenue.is_none());

        let revenue = analytics.expected_revenue.unwrap();
        assert!((revenue.avg - 2800.0).abs() < EPS);
        assert!((revenue.min - 2240.0).abs() < EPS);
        assert!((revenue.max - 3360.0).abs() < EPS);

        let profit = analytics.projected_profit.unwrap();
        assert!((profit.avg - 600.0).abs() < EPS);
        assert!((profit.min - 40.0).abs() < EPS);
    }

    #[test]
    fn margin_is_relative_to_cost() {
        let sets = vec![TicketSet::new("Set A", "Aug 28", "200s Row 1", 4, 400.0)];
        let analytics = revenue_analytics(&sets, &zero_fee(), |_| Some(500.0));
        let margin = analytics.items[0].profit_margin_pct.unwrap();
        assert!((margin - 25.0).abs() < EPS);
        assert_eq!(margin_pct(10.0, 0.0), None);
    }

    #[test]
    fn no_prices_leave_bands_empty() {
        let sets = vec![TicketSet::new("Set A", "Aug 28", "200s Row 1", 4, 400.0)];
        let analytics = revenue_analytics(&sets, &zero_fee(), |_| None);
        assert_eq!(analytics.expected_revenue, None);
        assert_eq!(analytics.projected_profit, None);
        assert_eq!(analytics.items[0].profit_margin_pct, None);
    }
}
