use crate::core::RateTable;
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// A rate table together with the moment it was fetched.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: Arc<RateTable>,
    pub fetched_at: Instant,
    pub updated_at: DateTime<Local>,
}

impl Snapshot {
    fn new(table: RateTable) -> Self {
        Self {
            table: Arc::new(table),
            fetched_at: Instant::now(),
            updated_at: Local::now(),
        }
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }
}

/// Cached table plus the last value observed for each queried code.
#[derive(Debug, Default)]
pub struct CacheState {
    snapshot: Option<Snapshot>,
    previous_values: HashMap<String, Decimal>,
}

impl CacheState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Snapshot> {
        self.snapshot.clone()
    }

    /// The cached snapshot, only if it is younger than `ttl`.
    pub fn fresh(&self, ttl: Duration) -> Option<Snapshot> {
        match &self.snapshot {
            Some(snapshot) if !snapshot.is_stale(ttl) => {
                debug!("Rate cache HIT");
                Some(snapshot.clone())
            }
            Some(_) => {
                debug!("Rate cache STALE");
                None
            }
            None => {
                debug!("Rate cache EMPTY");
                None
            }
        }
    }

    /// Swaps in a new table. Previous values survive the swap.
    pub fn replace(&mut self, table: RateTable) -> Snapshot {
        let snapshot = Snapshot::new(table);
        debug!(entries = snapshot.table.len(), "Rate cache PUT");
        self.snapshot = Some(snapshot.clone());
        snapshot
    }

    /// Records `value` for `code` and returns the change since the last observation.
    pub fn observe(&mut self, code: &str, value: Decimal) -> Decimal {
        match self.previous_values.insert(code.to_string(), value) {
            Some(previous) => value - previous,
            None => Decimal::ZERO,
        }
    }

    pub fn previous_value(&self, code: &str) -> Option<Decimal> {
        self.previous_values.get(code).copied()
    }
}
