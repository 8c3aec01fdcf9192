//! Price history queries over collected snapshots.

use std::collections::{BTreeMap, HashMap};

use time::OffsetDateTime;

use super::entities::PriceSnapshot;

const HOUR_SECS: i64 = 60 * 60;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Snapshots for one set (or all sets), newest first, at most `limit`.
pub fn query(snapshots: &[PriceSnapshot], set_name: Option<&str>, limit: usize) -> Vec<PriceSnapshot> {
    let mut selected: Vec<PriceSnapshot> = snapshots
        .iter()
        .filter(|snapshot| set_name.map_or(true, |name| snapshot.set_name == name))
        .cloned()
        .collect();
    // Stable sort keeps insertion order among equal timestamps.
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected.truncate(limit);
    selected
}

/// Most recent snapshot per set, ordered by set name.
pub fn latest_per_set(snapshots: &[PriceSnapshot]) -> Vec<PriceSnapshot> {
    let mut latest: BTreeMap<&str, &PriceSnapshot> = BTreeMap::new();
    for snapshot in snapshots {
        match latest.get(snapshot.set_name.as_str()) {
            Some(current) if current.timestamp > snapshot.timestamp => {}
            _ => {
                latest.insert(snapshot.set_name.as_str(), snapshot);
            }
        }
    }
    latest.into_values().cloned().collect()
}

pub fn last_updated(snapshots: &[PriceSnapshot]) -> Option<OffsetDateTime> {
    snapshots.iter().map(|snapshot| snapshot.timestamp).max()
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryBucket {
    pub bucket_start: OffsetDateTime,
    pub section: String,
    pub min_price: Option<f64>,
    /// Mean of the lowest-two averages reported in this bucket.
    pub avg_price: Option<f64>,
    pub listings_count: u64,
    pub total_seats: u64,
    pub snapshots: usize,
}

#[derive(Default)]
struct BucketAccumulator {
    min_price: Option<f64>,
    avg_sum: f64,
    avg_count: usize,
    listings_count: u64,
    total_seats: u64,
    snapshots: usize,
}

/// Groups snapshots into hourly buckets per venue section.
///
/// `section_of` maps a set name to its section; snapshots for unknown sets
/// are grouped under their set name.
pub fn aggregate_hourly(
    snapshots: &[PriceSnapshot],
    section_of: &HashMap<String, String>,
) -> Vec<HistoryBucket> {
    let mut buckets: BTreeMap<(i64, String), BucketAccumulator> = BTreeMap::new();

    for snapshot in snapshots {
        let section = section_of
            .get(&snapshot.set_name)
            .cloned()
            .unwrap_or_else(|| snapshot.set_name.clone());
        let entry = buckets
            .entry((hour_start(snapshot.timestamp), section))
            .or_default();

        if let Some(price) = snapshot.min_price.filter(|p| p.is_finite()) {
            entry.min_price = Some(entry.min_price.map_or(price, |current| current.min(price)));
        }
        if let Some(avg) = snapshot.avg_lowest_two.filter(|p| p.is_finite()) {
            entry.avg_sum += avg;
            entry.avg_count += 1;
        }
        entry.listings_count += u64::from(snapshot.listings_count);
        entry.total_seats += u64::from(snapshot.total_seats);
        entry.snapshots += 1;
    }

    buckets
        .into_iter()
        .map(|((start, section), acc)| HistoryBucket {
            bucket_start: OffsetDateTime::from_unix_timestamp(start)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
            section,
            min_price: acc.min_price,
            avg_price: (acc.avg_count > 0).then(|| acc.avg_sum / acc.avg_count as f64),
            listings_count: acc.listings_count,
            total_seats: acc.total_seats,
            snapshots: acc.snapshots,
        })
        .collect()
}

fn hour_start(timestamp: OffsetDateTime) -> i64 {
    let secs = timestamp.unix_timestamp();
    secs - secs.rem_euclid(HOUR_SECS)
}
