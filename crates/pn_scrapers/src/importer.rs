use pn_core::{parse_post_url, Error, ImportOutcome, PostStore, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::scrapers::MetadataFetcher;

type LockTable = StdMutex<HashMap<String, Arc<TokioMutex<()>>>>;

/// Runs the import flow: validate, fetch metadata, check for an existing
/// record, create one if absent.
///
/// Imports of the same URL are serialised within the process so concurrent
/// requests cannot both pass the existence check.
pub struct Importer {
    fetcher: Arc<dyn MetadataFetcher>,
    store: Arc<dyn PostStore>,
    in_flight: LockTable,
}

/// Holds the per-URL lock; drops the table entry once nobody else waits on it.
struct InFlight<'a> {
    table: &'a LockTable,
    key: String,
    lock: Arc<TokioMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // table + this handle
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.key);
        }
    }
}

impl Importer {
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, store: Arc<dyn PostStore>) -> Self {
        Self {
            fetcher,
            store,
            in_flight: StdMutex::new(HashMap::new()),
        }
    }

    pub fn fetcher_name(&self) -> &str {
        self.fetcher.name()
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    async fn acquire(&self, key: &str) -> InFlight<'_> {
        let lock = {
            let mut table = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            table
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(TokioMutex::new(())))
                .clone()
        };
        let guard = lock.clone().lock_owned().await;

        InFlight {
            table: &self.in_flight,
            key: key.to_string(),
            lock,
            guard: Some(guard),
        }
    }

    pub async fn import(&self, raw_url: &str) -> Result<ImportOutcome> {
        let parsed = parse_post_url(raw_url)?;
        let _in_flight = self.acquire(&parsed.url).await;

        info!(url = %parsed.url, fetcher = self.fetcher.name(), "📥 Importing post");
        let post = self.fetcher.fetch(&parsed).await?;

        if let Some(id) = self.store.find_existing(&post).await? {
            info!(url = %post.url, id = %id, "⏭️ Post already saved");
            return Ok(ImportOutcome::Existing { id });
        }

        match self.store.create(&post).await {
            Ok(id) => {
                info!(url = %post.url, id = %id, store = self.store.name(), "🆕 Post saved");
                Ok(ImportOutcome::Created { id })
            }
            Err(Error::Conflict(id)) => {
                warn!(url = %post.url, id = %id, "Store rejected duplicate post");
                Ok(ImportOutcome::Existing { id })
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.lock().map(|t| t.len()).unwrap_or(0)
    }
}
