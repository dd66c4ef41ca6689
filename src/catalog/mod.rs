//! Catalog snapshot cache.
//!
//! Fetching the sheet costs three Google API round trips, so the transformed
//! product list is kept for [`DEFAULT_CACHE_TTL`] and served from memory.
//! A snapshot is only ever replaced whole: readers see either the previous
//! list or the new one, and a failed fetch leaves the previous one in place.
//!
//! Concurrent callers that find the snapshot stale queue on a refresh gate;
//! whoever gets it first fetches, the rest reuse that result.

mod transform;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::domain::Product;
use crate::sheets::{RowSource, SheetsError};

pub use transform::build_products;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(300_000);

/// One complete, sorted product list.
pub type Snapshot = Arc<[Product]>;

#[derive(Default)]
struct CacheRecord {
    data: Option<Snapshot>,
    last_fetch: Option<Instant>,
    /// Bumped when a fetch starts and on every invalidation.
    epoch: u64,
    /// Epoch at which the fetch that produced `data` started.
    data_epoch: u64,
}

pub struct ProductCache {
    source: Arc<dyn RowSource>,
    ttl: Duration,
    record: RwLock<CacheRecord>,
    refresh_gate: Mutex<()>,
}

impl ProductCache {
    pub fn new(source: Arc<dyn RowSource>, ttl: Duration) -> Self {
        Self { source, ttl, record: RwLock::new(CacheRecord::default()), refresh_gate: Mutex::new(()) }
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    /// Returns the cached snapshot while it is fresh, otherwise fetches a new
    /// one. `force_refresh` skips the freshness check; it is only satisfied
    /// by a fetch that started after this call.
    pub async fn get_products(&self, force_refresh: bool) -> Result<Snapshot, SheetsError> {
        let ticket = {
            let record = self.record.read().await;
            if !force_refresh {
                if let Some(data) = self.fresh(&record) {
                    debug!("Returning cached products");
                    return Ok(data);
                }
            }
            record.epoch
        };

        let _gate = self.refresh_gate.lock().await;
        let started = {
            let mut record = self.record.write().await;
            if !force_refresh || record.data_epoch > ticket {
                if let Some(data) = self.fresh(&record) {
                    return Ok(data);
                }
            }
            record.epoch += 1;
            record.epoch
        };

        let data = self.fetch().await?;
        let mut record = self.record.write().await;
        if record.epoch == started {
            record.data = Some(data.clone());
            record.last_fetch = Some(Instant::now());
            record.data_epoch = started;
        } else {
            debug!("Cache invalidated during fetch, result not stored");
        }
        Ok(data)
    }

    /// Drops the snapshot so the next [`get_products`](Self::get_products)
    /// fetches. A fetch already in flight will not repopulate the cache.
    pub async fn invalidate(&self) {
        let mut record = self.record.write().await;
        record.epoch += 1;
        record.data = None;
        record.last_fetch = None;
        debug!("Product cache invalidated");
    }

    fn fresh(&self, record: &CacheRecord) -> Option<Snapshot> {
        let last_fetch = record.last_fetch?;
        if last_fetch.elapsed() < self.ttl { record.data.clone() } else { None }
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Snapshot, SheetsError> {
        info!("Fetching fresh catalog data");
        let rows = self.source.fetch_rows().await?;
        let products: Snapshot = build_products(&rows).into();
        info!(rows = rows.len(), products = products.len(), "Catalog loaded");
        Ok(products)
    }
}
