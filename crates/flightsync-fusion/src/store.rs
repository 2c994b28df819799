//! Keyed entity store.
//!
//! One [`PartialAircraft`] per [`IcaoCode`], created on the first fragment
//! for that key and merged by value on every following one. Records stay in
//! the store whether or not they are complete; the completeness gate
//! ([`try_complete`]) is evaluated on demand and never cached.
//!
//! Retention is explicit: [`RetentionPolicy::Unbounded`] keeps every record
//! for the lifetime of the store, [`RetentionPolicy::TimeToLive`] lets the
//! owner drop records that no feed has mentioned for a while.
//!
//! # Example
//!
//! ```rust
//! use std::time::Instant;
//! use flightsync_fusion::store::{EntityStore, try_complete};
//! use flightsync_types::{Fragment, IcaoCode, PositionReport};
//!
//! let mut store = EntityStore::default();
//! let fragment = Fragment::Position(PositionReport {
//!     icao: IcaoCode::new("3c6444").unwrap(),
//!     longitude: 8.6,
//!     latitude: 50.1,
//!     heading: 270.0,
//! });
//!
//! let record = store.merge(&fragment, Instant::now());
//! assert!(try_complete(record).is_none());
//! assert_eq!(store.len(), 1);
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use flightsync_types::{CompleteAircraft, Fragment, IcaoCode, PartialAircraft};
use tracing::debug;

/// How long a record survives without being merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Never evict.
    #[default]
    Unbounded,
    /// Evict records whose last merge is older than the given duration.
    TimeToLive(Duration),
}

#[derive(Debug)]
struct StoreEntry {
    record: PartialAircraft,
    last_seen: Instant,
}

/// Map from [`IcaoCode`] to the latest merged [`PartialAircraft`].
#[derive(Debug, Default)]
pub struct EntityStore {
    entries: HashMap<IcaoCode, StoreEntry>,
    retention: RetentionPolicy,
}

impl EntityStore {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            retention,
        }
    }

    /// Merge `fragment` into the record for its key, creating the record if
    /// needed, and return the updated record.
    ///
    /// Fields the fragment carries overwrite the stored ones; fields it does
    /// not carry are preserved. `now` refreshes the record's last-seen time.
    pub fn merge(&mut self, fragment: &Fragment, now: Instant) -> &PartialAircraft {
        let key = fragment.key();
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| StoreEntry {
                record: PartialAircraft::new(key.clone()),
                last_seen: now,
            });

        let previous = std::mem::replace(&mut entry.record, PartialAircraft::new(key.clone()));
        entry.record = previous.merged(fragment);
        entry.last_seen = now;
        &entry.record
    }

    /// Drop every record not merged within the retention window and return
    /// the evicted keys. Always empty under [`RetentionPolicy::Unbounded`].
    pub fn evict_stale(&mut self, now: Instant) -> Vec<IcaoCode> {
        let ttl = match self.retention {
            RetentionPolicy::Unbounded => return Vec::new(),
            RetentionPolicy::TimeToLive(ttl) => ttl,
        };

        let stale: Vec<IcaoCode> = self
            .entries
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.last_seen) > ttl)
            .map(|(k, _)| k.clone())
            .collect();

        for key in &stale {
            self.entries.remove(key);
        }
        if !stale.is_empty() {
            debug!(evicted = stale.len(), remaining = self.entries.len(), "evicted stale aircraft");
        }
        stale
    }

    pub fn get(&self, key: &IcaoCode) -> Option<&PartialAircraft> {
        self.entries.get(key).map(|e| &e.record)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartialAircraft> {
        self.entries.values().map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records that currently pass the completeness gate.
    pub fn complete_count(&self) -> usize {
        self.iter().filter(|r| r.is_complete()).count()
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }
}

/// Completeness gate: `Some` iff all six fields of `record` are populated.
pub fn try_complete(record: &PartialAircraft) -> Option<CompleteAircraft> {
    CompleteAircraft::from_partial(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightsync_types::{FlightInfo, PositionReport};

    fn icao(s: &str) -> IcaoCode {
        IcaoCode::new(s).unwrap()
    }

    fn position(key: &str, lon: f64, lat: f64, heading: f64) -> Fragment {
        Fragment::Position(PositionReport {
            icao: icao(key),
            longitude: lon,
            latitude: lat,
            heading,
        })
    }

    fn info(key: &str) -> Fragment {
        Fragment::Info(FlightInfo {
            icao: icao(key),
            model: "A320".to_string(),
            origin: "FRA".to_string(),
            destination: "LHR".to_string(),
        })
    }

    #[test]
    fn first_fragment_creates_record() {
        let mut store = EntityStore::default();
        let now = Instant::now();
        let record = store.merge(&position("a1", 8.0, 50.0, 10.0), now);
        assert_eq!(record.icao.as_str(), "A1");
        assert_eq!(record.longitude, Some(8.0));
        assert!(record.model.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn complete_after_both_feeds_regardless_of_order() {
        let now = Instant::now();

        let mut forward = EntityStore::default();
        forward.merge(&position("A1", 8.0, 50.0, 10.0), now);
        let a = try_complete(forward.merge(&info("A1"), now)).unwrap();

        let mut reverse = EntityStore::default();
        reverse.merge(&info("A1"), now);
        let b = try_complete(reverse.merge(&position("A1", 8.0, 50.0, 10.0), now)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn incomplete_records_are_kept() {
        let mut store = EntityStore::default();
        let now = Instant::now();
        store.merge(&position("A1", 8.0, 50.0, 10.0), now);
        store.merge(&info("B2"), now);
        assert_eq!(store.len(), 2);
        assert_eq!(store.complete_count(), 0);
    }

    #[test]
    fn later_position_overwrites_and_metadata_survives() {
        let mut store = EntityStore::default();
        let now = Instant::now();
        store.merge(&info("A1"), now);
        store.merge(&position("A1", 8.0, 50.0, 10.0), now);
        let record = store.merge(&position("A1", 9.0, 51.0, 20.0), now);
        assert_eq!(record.longitude, Some(9.0));
        assert_eq!(record.heading, Some(20.0));
        assert_eq!(record.model.as_deref(), Some("A320"));
        assert_eq!(store.complete_count(), 1);
    }

    #[test]
    fn unbounded_store_never_evicts() {
        let mut store = EntityStore::default();
        let start = Instant::now();
        store.merge(&info("A1"), start);
        let evicted = store.evict_stale(start + Duration::from_secs(86_400));
        assert!(evicted.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ttl_evicts_only_stale_records() {
        let mut store = EntityStore::new(RetentionPolicy::TimeToLive(Duration::from_secs(30)));
        let start = Instant::now();
        store.merge(&info("OLD"), start);
        store.merge(&info("NEW"), start + Duration::from_secs(25));

        let evicted = store.evict_stale(start + Duration::from_secs(40));
        assert_eq!(evicted, vec![icao("OLD")]);
        assert!(store.get(&icao("NEW")).is_some());
        assert!(store.get(&icao("OLD")).is_none());
    }

    #[test]
    fn merge_refreshes_last_seen() {
        let mut store = EntityStore::new(RetentionPolicy::TimeToLive(Duration::from_secs(30)));
        let start = Instant::now();
        store.merge(&info("A1"), start);
        store.merge(&position("A1", 1.0, 1.0, 1.0), start + Duration::from_secs(20));
        assert!(store.evict_stale(start + Duration::from_secs(45)).is_empty());
    }
}
