//! Background purge of expired cache entries.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::cache::store::ResultCache;

pub struct CacheSweeper {
    cache: Arc<ResultCache>,
}

impl CacheSweeper {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self { cache }
    }

    /// Run on its own task until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.cache.config().sweep_interval();
        tracing::info!(interval_ms = interval.as_millis() as u64, "Cache sweeper starting");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.cache.purge_expired();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.cache.len(), "Purged expired cache entries");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
