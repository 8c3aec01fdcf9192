use std::fmt;

use thiserror::Error;
use time::OffsetDateTime;

/// Identifier for ticket sets; unique across an inventory.
pub type SetName = String;

/// A block of tickets bought together, sharing event, section and cost basis.
#[derive(Clone, Debug, PartialEq)]
pub struct TicketSet {
    pub name: SetName,
    /// Display date of the event (e.g. "Aug 28").
    pub event_date: String,
    pub section: String,
    pub quantity: u32,
    pub cost_per_ticket: f64,
    /// User's expected sell range, used when no market price is known.
    pub target_sell_min: Option<f64>,
    pub target_sell_max: Option<f64>,
}

impl TicketSet {
    pub fn new(
        name: impl Into<SetName>,
        event_date: impl Into<String>,
        section: impl Into<String>,
        quantity: u32,
        cost_per_ticket: f64,
    ) -> Self {
        Self {
            name: name.into(),
            event_date: event_date.into(),
            section: section.into(),
            quantity,
            cost_per_ticket,
            target_sell_min: None,
            target_sell_max: None,
        }
    }

    pub fn with_target_range(mut self, min: f64, max: f64) -> Self {
        self.target_sell_min = Some(min);
        self.target_sell_max = Some(max);
        self
    }

    pub fn total_cost(&self) -> f64 {
        self.cost_per_ticket * self.quantity as f64
    }

    /// Midpoint of the target sell range, only when both ends are set.
    pub fn target_midpoint(&self) -> Option<f64> {
        match (self.target_sell_min, self.target_sell_max) {
            (Some(min), Some(max)) if min.is_finite() && max.is_finite() => {
                Some((min + max) / 2.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeeScheduleError {
    #[error("platform name must not be empty")]
    EmptyName,
    #[error("fee rate {rate} for {platform} must be within [0, 1)")]
    InvalidRate { platform: String, rate: f64 },
}

/// A resale platform and the fraction of the gross price it keeps.
///
/// The rate is checked once here so every later fee or breakeven
/// computation on a schedule is total.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformFeeSchedule {
    name: String,
    fee_rate: f64,
}

impl PlatformFeeSchedule {
    pub fn new(name: impl Into<String>, fee_rate: f64) -> Result<Self, FeeScheduleError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FeeScheduleError::EmptyName);
        }
        if !fee_rate.is_finite() || !(0.0..1.0).contains(&fee_rate) {
            return Err(FeeScheduleError::InvalidRate {
                platform: name,
                rate: fee_rate,
            });
        }
        Ok(Self { name, fee_rate })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }
}

impl fmt::Display for PlatformFeeSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.0}% fee)", self.name, self.fee_rate * 100.0)
    }
}

/// Derived per (set, schedule, price). Never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfitProjection {
    pub net_receive: f64,
    pub profit_per_ticket: f64,
    pub aggregate_profit: f64,
}

/// Summary of the comparable listings for one set on one platform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarketData {
    pub listings_count: u64,
    pub total_seats: u64,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_price: Option<f64>,
    /// Mean of the two cheapest listings; closer to a realistic sale price than the min.
    pub avg_lowest_two: Option<f64>,
}

impl MarketData {
    pub fn reference_price(&self) -> Option<f64> {
        self.avg_lowest_two
            .or(self.min_price)
            .filter(|price| price.is_finite() && *price >= 0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarketObservation {
    pub platform: String,
    pub data: MarketData,
}

/// One inventory row as delivered by the backend: the set plus whatever
/// market data each platform currently has for it.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryEntry {
    pub set: TicketSet,
    pub observations: Vec<MarketObservation>,
}

impl InventoryEntry {
    /// First observation (in platform order) that carries a usable price.
    pub fn market_price(&self) -> Option<f64> {
        self.observations
            .iter()
            .find_map(|observation| observation.data.reference_price())
    }

    pub fn comparable_count(&self) -> u64 {
        self.observations
            .iter()
            .fold(0, |count, observation| {
                count.saturating_add(observation.data.listings_count)
            })
    }
}

/// Periodic price observation for one set.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSnapshot {
    pub timestamp: OffsetDateTime,
    pub set_name: SetName,
    pub min_price: Option<f64>,
    pub avg_lowest_two: Option<f64>,
    pub listings_count: u32,
    pub total_seats: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_cost_multiplies_quantity() {
        let set = TicketSet::new("Set A", "Aug 28", "200s Row 1", 4, 471.25);
        assert_eq!(set.total_cost(), 1885.0);
    }

    #[test]
    fn fee_schedule_rejects_out_of_range_rates() {
        assert!(PlatformFeeSchedule::new("Vivid", 0.0).is_ok());
        assert!(PlatformFeeSchedule::new("Vivid", 0.999).is_ok());
        assert!(matches!(
            PlatformFeeSchedule::new("Vivid", 1.0),
            Err(FeeScheduleError::InvalidRate { .. })
        ));
        assert!(PlatformFeeSchedule::new("Vivid", -0.01).is_err());
        assert!(PlatformFeeSchedule::new("Vivid", f64::NAN).is_err());
        assert_eq!(
            PlatformFeeSchedule::new("  ", 0.1),
            Err(FeeScheduleError::EmptyName)
        );
    }

    #[test]
    fn reference_price_prefers_lowest_two_average() {
        let data = MarketData {
            min_price: Some(600.0),
            avg_lowest_two: Some(650.0),
            ..MarketData::default()
        };
        assert_eq!(data.reference_price(), Some(650.0));

        let only_min = MarketData {
            min_price: Some(600.0),
            ..MarketData::default()
        };
        assert_eq!(only_min.reference_price(), Some(600.0));
        assert_eq!(MarketData::default().reference_price(), None);
    }

    #[test]
    fn target_midpoint_requires_both_ends() {
        let set = TicketSet::new("Set B", "Sept 19", "Left GA", 6, 490.67);
        assert_eq!(set.target_midpoint(), None);
        let set = set.with_target_range(500.0, 700.0);
        assert_eq!(set.target_midpoint(), Some(600.0));
    }
}
