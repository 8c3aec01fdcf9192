use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};

use super::analytics::{revenue_analytics, RevenueAnalytics};
use super::comparison::{compare_portfolio, PortfolioComparison};
use super::entities::{InventoryEntry, PlatformFeeSchedule, SetName, TicketSet};
use super::projection::{parse_price_input, project_portfolio, PortfolioProjection};

/// Everything a dashboard view needs to render projections.
///
/// Views never redo fee or profit arithmetic themselves; they ask this state,
/// which hands the current inputs to the projection engine.
#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    pub entries: Vec<InventoryEntry>,
    pub schedules: Vec<PlatformFeeSchedule>,
    /// Sensitivity inputs typed by the user, keyed by set name.
    manual_prices: HashMap<SetName, f64>,
    fetched_at: Option<SystemTime>,
}

impl DashboardState {
    pub fn new(schedules: Vec<PlatformFeeSchedule>) -> Self {
        Self {
            schedules,
            ..Self::default()
        }
    }

    pub fn apply_inventory(&mut self, entries: Vec<InventoryEntry>, fetched_at: SystemTime) {
        self.entries = entries;
        self.fetched_at = Some(fetched_at);
    }

    pub fn sets(&self) -> Vec<TicketSet> {
        self.entries.iter().map(|entry| entry.set.clone()).collect()
    }

    /// Stores a typed price for a set. Input that is not a usable price
    /// clears the override instead of failing.
    pub fn set_manual_input(&mut self, set_name: &str, raw: &str) -> Option<f64> {
        match parse_price_input(raw) {
            Some(price) => {
                self.manual_prices.insert(set_name.to_string(), price);
                Some(price)
            }
            None => {
                self.manual_prices.remove(set_name);
                None
            }
        }
    }

    pub fn clear_manual_inputs(&mut self) {
        self.manual_prices.clear();
    }

    pub fn manual_price(&self, set_name: &str) -> Option<f64> {
        self.manual_prices.get(set_name).copied()
    }

    /// Manual input first, then the market reference price.
    pub fn quoted_price(&self, set_name: &str) -> Option<f64> {
        self.manual_price(set_name).or_else(|| {
            self.entries
                .iter()
                .find(|entry| entry.set.name == set_name)
                .and_then(InventoryEntry::market_price)
        })
    }

    pub fn schedule(&self, platform: &str) -> Option<&PlatformFeeSchedule> {
        self.schedules
            .iter()
            .find(|schedule| schedule.name().eq_ignore_ascii_case(platform))
    }

    pub fn portfolio(&self, schedule: &PlatformFeeSchedule) -> PortfolioProjection {
        project_portfolio(&self.sets(), schedule, |name| self.quoted_price(name))
    }

    pub fn comparison(&self) -> PortfolioComparison {
        compare_portfolio(&self.sets(), &self.schedules, |name| self.quoted_price(name))
    }

    pub fn analytics(&self, schedule: &PlatformFeeSchedule) -> RevenueAnalytics {
        revenue_analytics(&self.sets(), schedule, |name| self.quoted_price(name))
    }

    pub fn fetched_at(&self) -> Option<SystemTime> {
        self.fetched_at
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at
            .map(|time| time.elapsed().map(|elapsed| elapsed > ttl).unwrap_or(true))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{MarketData, MarketObservation};

    fn state() -> DashboardState {
        let mut state = DashboardState::new(vec![
            PlatformFeeSchedule::new("Vivid", 0.10).unwrap(),
            PlatformFeeSchedule::new("StubHub", 0.15).unwrap(),
        ]);
        state.apply_inventory(
            vec![
                InventoryEntry {
                    set: TicketSet::new("Set A", "Aug 28", "200s Row 1", 4, 471.25),
                    observations: vec![MarketObservation {
                        platform: "Vivid".to_string(),
                        data: MarketData {
                            listings_count: 3,
                            min_price: Some(690.0),
                            avg_lowest_two: Some(700.0),
                            ..MarketData::default()
                        },
                    }],
                },
                InventoryEntry {
                    set: TicketSet::new("Set B", "Sept 19", "Left GA", 6, 490.67),
                    observations: Vec::new(),
                },
            ],
            SystemTime::now(),
        );
        state
    }

    #[test]
    fn market_price_feeds_projection() {
        let state = state();
        let vivid = state.schedule("vivid").unwrap().clone();
        let portfolio = state.portfolio(&vivid);
        assert!((portfolio.total_profit - 635.0).abs() < 1e-9);
        assert!(portfolio.per_set[1].is_none());
        assert!((portfolio.total_cost - (1885.0 + 6.0 * 490.67)).abs() < 1e-9);
    }

    #[test]
    fn manual_input_overrides_and_clears() {
        let mut state = state();
        assert_eq!(state.set_manual_input("Set A", "$800"), Some(800.0));
        assert_eq!(state.quoted_price("Set A"), Some(800.0));

        assert_eq!(state.set_manual_input("Set A", "oops"), None);
        assert_eq!(state.quoted_price("Set A"), Some(700.0));

        state.set_manual_input("Set B", "550");
        let comparison = state.comparison();
        assert_eq!(comparison.sets[1].gross_price, Some(550.0));
        assert_eq!(comparison.best_overall.as_deref(), Some("Vivid"));

        state.clear_manual_inputs();
        assert_eq!(state.quoted_price("Set B"), None);
    }

    #[test]
    fn freshness_tracks_fetch_time() {
        let state = state();
        assert!(!state.is_stale(Duration::from_secs(60)));
        assert!(DashboardState::default().is_stale(Duration::from_secs(60)));
    }
}
