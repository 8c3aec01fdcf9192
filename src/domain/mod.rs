//! Domain logic for ticket profit projection lives here.

pub mod analytics;
pub mod app_state;
pub mod comparison;
pub mod entities;
pub mod history;
pub mod market;
pub mod projection;

pub use app_state::DashboardState;
pub use entities::{
    FeeScheduleError, InventoryEntry, MarketData, MarketObservation, PlatformFeeSchedule,
    PriceSnapshot, ProfitProjection, SetName, TicketSet,
};
pub use projection::{
    aggregate_profit, breakeven_price, net_receive, parse_price_input, profit_per_ticket,
    project_portfolio, project_set, PortfolioProjection, ProjectionError,
};
pub use comparison::{
    best_platform, compare_portfolio, project_platforms, PlatformProjection, PlatformTotals,
    PortfolioComparison, SetComparison,
};
pub use analytics::{revenue_analytics, Band, RevenueAnalytics, SetRevenue};
pub use market::{summarize_listings, Listing, ListingFilter};
