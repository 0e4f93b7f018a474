use crate::config::AppConfig;
use crate::dataset::loader::{self, LoadedDataset};
use crate::dataset::types::DashboardData;
use crate::errors::DashboardResult;
use crate::rebase::{self, RebasePlan};
use portable_atomic::{AtomicU64, Ordering};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};

// ── Messages OUT to dashboard clients ──

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    /// Sent once when a client connects.
    #[serde(rename = "dataset_version")]
    DatasetVersion {
        generation: u64,
        fingerprint: String,
        loaded_at: String,
    },

    #[serde(rename = "dataset_reloaded")]
    DatasetReloaded {
        generation: u64,
        fingerprint: String,
        loaded_at: String,
    },
}

impl WsMessage {
    pub fn version_of(dataset: &LoadedDataset) -> Self {
        Self::DatasetVersion {
            generation: dataset.version.generation,
            fingerprint: dataset.version.fingerprint.clone(),
            loaded_at: dataset.loaded_at.to_rfc3339(),
        }
    }

    pub fn reloaded(dataset: &LoadedDataset) -> Self {
        Self::DatasetReloaded {
            generation: dataset.version.generation,
            fingerprint: dataset.version.fingerprint.clone(),
            loaded_at: dataset.loaded_at.to_rfc3339(),
        }
    }
}

// ── Rebase memoization ──

type CacheKey = (u64, i32);

/// Rebased datasets keyed by `(generation, start_year)`. Bounded; the oldest
/// entry is evicted first. Identity requests never reach it.
pub struct RebaseCache {
    capacity: usize,
    entries: Mutex<VecDeque<(CacheKey, Arc<DashboardData>)>>,
}

impl RebaseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<(CacheKey, Arc<DashboardData>)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: CacheKey) -> Option<Arc<DashboardData>> {
        self.lock()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, data)| Arc::clone(data))
    }

    pub fn insert(&self, key: CacheKey, data: Arc<DashboardData>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        if entries.iter().any(|(k, _)| *k == key) {
            return;
        }
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back((key, data));
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub requests_served: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub reloads: AtomicU64,
    pub reload_failures: AtomicU64,
    pub ws_messages_sent: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            requests_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            reload_failures: AtomicU64::new(0),
            ws_messages_sent: AtomicU64::new(0),
        }
    }
}

/// Result of asking the state to re-read the dataset file.
#[derive(Debug, Clone)]
pub enum ReloadOutcome {
    /// File content matches the dataset in service.
    Unchanged(Arc<LoadedDataset>),
    Replaced(Arc<LoadedDataset>),
}

impl ReloadOutcome {
    pub fn dataset(&self) -> &Arc<LoadedDataset> {
        match self {
            Self::Unchanged(d) | Self::Replaced(d) => d,
        }
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,

    // Loader -> handlers: dataset in service (watch = single producer, multi consumer)
    pub dataset_tx: watch::Sender<Arc<LoadedDataset>>,
    pub dataset_rx: watch::Receiver<Arc<LoadedDataset>>,

    // Reload notifications for WS clients
    pub ws_tx: broadcast::Sender<WsMessage>,

    pub cache: RebaseCache,

    // Serializes watcher and manual reloads so generations stay unique
    reload_lock: tokio::sync::Mutex<()>,

    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, dataset: LoadedDataset) -> Arc<Self> {
        let (ws_tx, _) = broadcast::channel(64);
        let (dataset_tx, dataset_rx) = watch::channel(Arc::new(dataset));
        let cache = RebaseCache::new(config.rebase_cache_capacity);

        Arc::new(Self {
            config,
            dataset_tx,
            dataset_rx,
            ws_tx,
            cache,
            reload_lock: tokio::sync::Mutex::new(()),
            counters: PerfCounters::new(),
        })
    }

    /// Dataset currently in service.
    #[inline]
    pub fn current(&self) -> Arc<LoadedDataset> {
        Arc::clone(&self.dataset_rx.borrow())
    }

    /// The dataset rebased to `start_year`, memoized per dataset generation.
    /// Also returns the dataset it was derived from so callers can tag the
    /// response with a consistent version.
    pub fn rebased(&self, start_year: Option<i32>) -> (Arc<LoadedDataset>, Arc<DashboardData>) {
        let current = self.current();

        let year = match (rebase::plan_rebase(&current.data, start_year), start_year) {
            (RebasePlan::Rebased { .. }, Some(year)) => year,
            _ => {
                let data = Arc::clone(&current.data);
                return (current, data);
            }
        };

        let key = (current.version.generation, year);
        if let Some(hit) = self.cache.get(key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return (current, hit);
        }

        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        let data = Arc::new(rebase::rebase_dashboard(&current.data, start_year).into_owned());
        self.cache.insert(key, Arc::clone(&data));
        (current, data)
    }

    /// Put a new dataset in service, drop memoized rebases of the old one and
    /// notify connected clients.
    pub fn replace_dataset(&self, dataset: LoadedDataset) -> Arc<LoadedDataset> {
        let dataset = Arc::new(dataset);
        self.dataset_tx.send_replace(Arc::clone(&dataset));
        self.cache.clear();
        self.counters.reloads.fetch_add(1, Ordering::Relaxed);
        self.broadcast(WsMessage::reloaded(&dataset));

        tracing::info!(
            generation = dataset.version.generation,
            fingerprint = %dataset.version.fingerprint,
            "dataset replaced"
        );
        dataset
    }

    /// Re-read the configured file. Without `force`, a file whose fingerprint
    /// matches the dataset in service is left alone.
    pub async fn reload(&self, force: bool) -> DashboardResult<ReloadOutcome> {
        let _guard = self.reload_lock.lock().await;

        let result = self.reload_locked(force).await;
        if result.is_err() {
            self.counters.reload_failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    async fn reload_locked(&self, force: bool) -> DashboardResult<ReloadOutcome> {
        let path = &self.config.data_path;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            crate::errors::DashboardError::Io(format!("read {}: {e}", path.display()))
        })?;

        let current = self.current();
        if !force && loader::fingerprint(&bytes) == current.version.fingerprint {
            return Ok(ReloadOutcome::Unchanged(current));
        }

        let next = loader::from_bytes(&bytes, current.version.generation + 1)?;
        Ok(ReloadOutcome::Replaced(self.replace_dataset(next)))
    }

    #[inline]
    pub fn broadcast(&self, msg: WsMessage) {
        self.counters.ws_messages_sent.fetch_add(1, Ordering::Relaxed);
        let _ = self.ws_tx.send(msg);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::rebase::fixtures::sample_dashboard;

    pub fn config_for(path: &std::path::Path) -> AppConfig {
        AppConfig {
            data_path: path.to_path_buf(),
            static_dir: std::path::PathBuf::from("out"),
            server_port: 0,
            reload_interval_secs: 0,
            rebase_cache_capacity: 4,
        }
    }

    pub fn sample_bytes() -> Vec<u8> {
        serde_json::to_vec(&sample_dashboard()).unwrap()
    }

    /// State over the sample dashboard, backed by a temp file holding it.
    pub fn sample_state() -> (Arc<AppState>, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), sample_bytes()).unwrap();
        let loaded = loader::load_dataset(file.path(), 1).unwrap();
        (AppState::new(config_for(file.path()), loaded), file)
    }
}
