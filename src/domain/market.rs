//! Turns raw resale listings into the per-set market summary.

use super::entities::MarketData;

/// Listings under this all-in price are parking passes or mislabeled rows.
pub const DEFAULT_PRICE_FLOOR: f64 = 100.0;

/// How many of the cheapest listings feed the realistic sale price.
pub const LOWEST_LISTINGS_SAMPLE: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    pub section: String,
    pub row: Option<String>,
    /// All-in price per ticket as shown to buyers.
    pub price: f64,
    pub quantity: u32,
}

/// Which listings count as comparable to a ticket set.
#[derive(Clone, Debug, PartialEq)]
pub struct ListingFilter {
    /// Case-insensitive substring of the listing's section (e.g. "SECTION 2", "LEFT").
    pub section: String,
    /// Exact row match when set.
    pub row: Option<String>,
    pub price_floor: f64,
}

impl ListingFilter {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            row: None,
            price_floor: DEFAULT_PRICE_FLOOR,
        }
    }

    pub fn with_row(mut self, row: impl Into<String>) -> Self {
        self.row = Some(row.into());
        self
    }

    pub fn with_price_floor(mut self, floor: f64) -> Self {
        self.price_floor = floor;
        self
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if !listing.price.is_finite() || listing.price < self.price_floor {
            return false;
        }
        if !listing
            .section
            .to_uppercase()
            .contains(&self.section.to_uppercase())
        {
            return false;
        }
        match self.row.as_deref() {
            Some(row) => listing
                .row
                .as_deref()
                .map(|value| value.trim().eq_ignore_ascii_case(row.trim()))
                .unwrap_or(false),
            None => true,
        }
    }
}

pub fn summarize_listings(listings: &[Listing], filter: &ListingFilter) -> MarketData {
    let mut prices = Vec::new();
    let mut total_seats = 0_u64;

    for listing in listings.iter().filter(|listing| filter.matches(listing)) {
        prices.push(listing.price);
        total_seats += u64::from(listing.quantity);
    }

    if prices.is_empty() {
        return MarketData::default();
    }

    prices.sort_by(f64::total_cmp);
    let count = prices.len();
    let avg_price = prices.iter().sum::<f64>() / count as f64;

    MarketData {
        listings_count: count as u64,
        total_seats,
        min_price: prices.first().copied(),
        max_price: prices.last().copied(),
        avg_price: Some(avg_price),
        avg_lowest_two: average_of_lowest(&prices, LOWEST_LISTINGS_SAMPLE),
    }
}

/// Mean of the `n` smallest values of an ascending slice; with fewer values
/// than `n` it averages what is there.
pub fn average_of_lowest(sorted_prices: &[f64], n: usize) -> Option<f64> {
    let take = sorted_prices.len().min(n);
    if take == 0 {
        return None;
    }
    Some(sorted_prices[..take].iter().sum::<f64>() / take as f64)
}
