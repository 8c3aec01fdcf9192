//! Thin asynchronous client for the inventory backend.
//!
//! - Typed accessors for the comparison and price-history endpoints.
//! - Keeps the last inventory in memory for a TTL and serves it stale when
//!   the backend is unreachable.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::domain::{InventoryEntry, MarketData, MarketObservation, PriceSnapshot, TicketSet};

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("ticket-value-scanner/", env!("CARGO_PKG_VERSION"));

/// Platform labels for the market blocks the comparison endpoint returns.
const VIVID_PLATFORM: &str = "Vivid";
const STUBHUB_PLATFORM: &str = "StubHub";

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self {
            data,
            fetched_at,
            status,
        }
    }
}

#[derive(Default)]
struct InventoryCache {
    inventory: Option<Cached<Vec<InventoryEntry>>>,
}

#[derive(Clone)]
pub struct InventoryClient {
    http: Client,
    base_url: Url,
    cache: Arc<Mutex<InventoryCache>>,
    ttl: Duration,
}

impl InventoryClient {
    pub fn with_base_url(base: &str) -> Result<Self, ApiClientError> {
        let base_url = normalize_base(base)?;
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            cache: Arc::new(Mutex::new(InventoryCache::default())),
            ttl: DEFAULT_TTL,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ticket sets with their current market data on every platform.
    pub async fn get_inventory(&self) -> Result<CachedPayload<Vec<InventoryEntry>>, ApiClientError> {
        if let Some(payload) = self.cached_inventory().await {
            tracing::debug!("serving cached inventory");
            return Ok(payload);
        }

        let url = self.url("comparison")?;
        tracing::info!(%url, "requesting inventory comparison");
        match self.fetch_json::<ComparisonDto>(self.http.get(url)).await {
            Ok(response) => {
                let entries = response
                    .sets
                    .into_iter()
                    .map(InventoryEntry::from)
                    .collect::<Vec<_>>();
                tracing::info!(sets = entries.len(), "loaded inventory");
                Ok(self.store_inventory(entries).await)
            }
            Err(error) => {
                if let Some(stale) = self.cached_inventory_stale().await {
                    tracing::warn!(%error, "backend unavailable, serving stale inventory");
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }

    /// Snapshots newest first, optionally for one set.
    pub async fn get_history(
        &self,
        set_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PriceSnapshot>, ApiClientError> {
        let mut url = self.url("history")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(name) = set_name {
                query.append_pair("set_name", name);
            }
            query.append_pair("limit", &limit.to_string());
        }
        let response: HistoryDto = self.fetch_json(self.http.get(url)).await?;
        Ok(snapshots_from(response.snapshots))
    }

    pub async fn get_latest_snapshots(&self) -> Result<Vec<PriceSnapshot>, ApiClientError> {
        let url = self.url("history/latest")?;
        let response: HistoryDto = self.fetch_json(self.http.get(url)).await?;
        Ok(snapshots_from(response.snapshots))
    }

    /// Asks the backend to record a snapshot for every set now.
    pub async fn take_snapshot(&self) -> Result<Vec<PriceSnapshot>, ApiClientError> {
        let url = self.url("history/snapshot")?;
        let response: SnapshotTakenDto = self.fetch_json(self.http.post(url)).await?;
        if !response.status.eq_ignore_ascii_case("ok") {
            return Err(ApiClientError::Api(response.status));
        }
        Ok(snapshots_from(response.snapshots))
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.inventory = None;
    }

    async fn cached_inventory(&self) -> Option<CachedPayload<Vec<InventoryEntry>>> {
        let cache = self.cache.lock().await;
        cache
            .inventory
            .as_ref()
            .and_then(|entry| entry.if_fresh(self.ttl))
    }

    async fn cached_inventory_stale(&self) -> Option<CachedPayload<Vec<InventoryEntry>>> {
        let cache = self.cache.lock().await;
        cache.inventory.as_ref().map(Cached::stale)
    }

    async fn store_inventory(&self, data: Vec<InventoryEntry>) -> CachedPayload<Vec<InventoryEntry>> {
        let fetched_at = SystemTime::now();
        let payload = CachedPayload::new(data.clone(), fetched_at, CacheStatus::Fresh);
        let mut cache = self.cache.lock().await;
        cache.inventory = Some(Cached::new(data, fetched_at));
        payload
    }

    async fn fetch_json<T>(&self, builder: reqwest::RequestBuilder) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

/// `Url::join` drops the last segment unless the base ends with a slash.
fn normalize_base(base: &str) -> Result<Url, url::ParseError> {
    if base.ends_with('/') {
        Url::parse(base)
    } else {
        Url::parse(&format!("{base}/"))
    }
}

struct Cached<T> {
    value: T,
    fetched_at: SystemTime,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, fetched_at: SystemTime) -> Self {
        Self { value, fetched_at }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<CachedPayload<T>> {
        if self
            .fetched_at
            .elapsed()
            .map(|elapsed| elapsed <= ttl)
            .unwrap_or(false)
        {
            Some(CachedPayload::new(
                self.value.clone(),
                self.fetched_at,
                CacheStatus::Cached,
            ))
        } else {
            None
        }
    }

    fn stale(&self) -> CachedPayload<T> {
        CachedPayload::new(self.value.clone(), self.fetched_at, CacheStatus::Stale)
    }
}

#[derive(Debug, Deserialize)]
struct ComparisonDto {
    sets: Vec<TicketSetDto>,
}

#[derive(Debug, Deserialize)]
struct TicketSetDto {
    set_name: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    section: String,
    quantity: u32,
    cost_per_ticket: f64,
    #[serde(default)]
    target_sell_min: Option<f64>,
    #[serde(default)]
    target_sell_max: Option<f64>,
    #[serde(default)]
    vivid_market: Option<MarketDto>,
    #[serde(default)]
    stubhub_market: Option<MarketDto>,
}

#[derive(Debug, Deserialize)]
struct MarketDto {
    #[serde(default)]
    listings_count: u64,
    #[serde(default)]
    total_seats: u64,
    #[serde(default)]
    min_price: Option<f64>,
    #[serde(default)]
    max_price: Option<f64>,
    #[serde(default)]
    avg_price: Option<f64>,
    #[serde(default)]
    avg_lowest_2: Option<f64>,
}

impl From<MarketDto> for MarketData {
    fn from(dto: MarketDto) -> Self {
        Self {
            listings_count: dto.listings_count,
            total_seats: dto.total_seats,
            min_price: dto.min_price,
            max_price: dto.max_price,
            avg_price: dto.avg_price,
            avg_lowest_two: dto.avg_lowest_2,
        }
    }
}

impl From<TicketSetDto> for InventoryEntry {
    fn from(dto: TicketSetDto) -> Self {
        let observations = [
            (VIVID_PLATFORM, dto.vivid_market),
            (STUBHUB_PLATFORM, dto.stubhub_market),
        ]
        .into_iter()
        .filter_map(|(platform, market)| {
            market.map(|data| MarketObservation {
                platform: platform.to_string(),
                data: data.into(),
            })
        })
        .collect();

        Self {
            set: TicketSet {
                name: dto.set_name,
                event_date: dto.date,
                section: dto.section,
                quantity: dto.quantity,
                cost_per_ticket: dto.cost_per_ticket,
                target_sell_min: dto.target_sell_min,
                target_sell_max: dto.target_sell_max,
            },
            observations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryDto {
    #[serde(default)]
    snapshots: Vec<SnapshotDto>,
}

#[derive(Debug, Deserialize)]
struct SnapshotTakenDto {
    status: String,
    #[serde(default)]
    snapshots: Vec<SnapshotDto>,
}

#[derive(Debug, Deserialize)]
struct SnapshotDto {
    timestamp: String,
    set_name: String,
    #[serde(default)]
    min_price: Option<f64>,
    #[serde(default)]
    avg_lowest_2: Option<f64>,
    #[serde(default)]
    listings_count: u32,
    #[serde(default)]
    total_seats: u32,
}

fn snapshots_from(dtos: Vec<SnapshotDto>) -> Vec<PriceSnapshot> {
    dtos.into_iter()
        .filter_map(|dto| {
            let Some(timestamp) = parse_timestamp(&dto.timestamp) else {
                tracing::warn!(set = %dto.set_name, raw = %dto.timestamp, "dropping snapshot with bad timestamp");
                return None;
            };
            Some(PriceSnapshot {
                timestamp,
                set_name: dto.set_name,
                min_price: dto.min_price,
                avg_lowest_two: dto.avg_lowest_2,
                listings_count: dto.listings_count,
                total_seats: dto.total_seats,
            })
        })
        .collect()
}

/// RFC 3339; timestamps without an offset are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&format!("{raw}Z"), &Rfc3339))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPARISON: &str = r#"{
        "sets": [
            {
                "set_name": "Set A",
                "date": "Aug 28",
                "section": "200s Row 1",
                "quantity": 4,
                "cost_per_ticket": 471.25,
                "total_cost": 1885.0,
                "vivid_event_id": "6564568",
                "best_platform": "Vivid",
                "vivid_market": {
                    "listings_count": 3,
                    "total_seats": 8,
                    "min_price": 690.0,
                    "max_price": 810.0,
                    "avg_price": 740.0,
                    "avg_lowest_2": 705.0
                },
                "stubhub_market": null
            },
            {
                "set_name": "Set B",
                "date": "Sept 19",
                "section": "Left GA",
                "quantity": 6,
                "cost_per_ticket": 490.67
            }
        ],
        "summary": { "total_tickets": 10 }
    }"#;

    #[test]
    fn comparison_payload_maps_to_inventory() {
        let dto: ComparisonDto = serde_json::from_str(COMPARISON).unwrap();
        let entries: Vec<InventoryEntry> = dto.sets.into_iter().map(InventoryEntry::from).collect();

        assert_eq!(entries.len(), 2);
        let a = &entries[0];
        assert_eq!(a.set.name, "Set A");
        assert_eq!(a.set.quantity, 4);
        assert_eq!(a.observations.len(), 1);
        assert_eq!(a.observations[0].platform, "Vivid");
        assert_eq!(a.market_price(), Some(705.0));
        assert_eq!(a.comparable_count(), 3);

        assert!(entries[1].observations.is_empty());
        assert_eq!(entries[1].market_price(), None);
    }

    #[test]
    fn snapshots_parse_with_and_without_offset() {
        let dto: HistoryDto = serde_json::from_str(
            r#"{ "snapshots": [
                { "timestamp": "2026-08-01T10:15:00Z", "set_name": "Set A", "min_price": 690.0,
                  "avg_lowest_2": 705.0, "listings_count": 3, "total_seats": 8 },
                { "timestamp": "2026-08-01T11:15:00", "set_name": "Set B", "min_price": null,
                  "avg_lowest_2": null, "listings_count": 0, "total_seats": 0 },
                { "timestamp": "yesterday", "set_name": "Set C" }
            ], "last_updated": null }"#,
        )
        .unwrap();

        let snapshots = snapshots_from(dto.snapshots);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].timestamp.unix_timestamp(), 1_785_579_300);
        assert_eq!(snapshots[0].avg_lowest_two, Some(705.0));
        assert_eq!(snapshots[1].timestamp.unix_timestamp(), 1_785_582_900);
        assert_eq!(snapshots[1].min_price, None);
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let client = InventoryClient::with_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/");
        assert_eq!(
            client.url("history/latest").unwrap().as_str(),
            "http://localhost:8000/api/history/latest"
        );
        assert!(InventoryClient::with_base_url("not a url").is_err());
    }

    #[tokio::test]
    async fn cached_inventory_respects_ttl() {
        let client = InventoryClient::with_base_url("http://localhost:8000/api/")
            .unwrap()
            .with_ttl(Duration::from_secs(60));
        assert!(client.cached_inventory().await.is_none());

        let stored = client.store_inventory(Vec::new()).await;
        assert_eq!(stored.status, CacheStatus::Fresh);
        let cached = client.cached_inventory().await.unwrap();
        assert_eq!(cached.status, CacheStatus::Cached);

        client.cache.lock().await.inventory = Some(Cached::new(
            Vec::new(),
            SystemTime::now() - Duration::from_secs(120),
        ));
        assert!(client.cached_inventory().await.is_none());
        assert_eq!(
            client.cached_inventory_stale().await.unwrap().status,
            CacheStatus::Stale
        );

        client.clear_cache().await;
        assert!(client.cached_inventory_stale().await.is_none());
    }
}
