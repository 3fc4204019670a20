use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::error::LoadError;
use crate::pipeline::load::{self, Dataset};
use crate::types::session::Session;
use crate::types::viz::OutputFormat;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub generation: u64,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub background: Option<String>,
}

/// A dataset together with the load it came from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub dataset: Arc<Dataset>,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    client: reqwest::Client,
    snapshot: Arc<RwLock<Snapshot>>,
    cache: Arc<DashMap<RenderKey, CachedRender>>,
    local_writes: Arc<Mutex<()>>,
    reloads: Arc<Mutex<()>>,
}

struct CachedRender {
    bytes: Vec<u8>,
    inserted_at: Instant,
}

impl AppState {
    pub fn new(config: Config, dataset: Dataset) -> Self {
        Self::with_client(config, reqwest::Client::new(), dataset)
    }

    pub async fn load(config: Config) -> Self {
        let client = reqwest::Client::new();
        let dataset = load::load_dataset(&config, &client).await;
        Self::with_client(config, client, dataset)
    }

    fn with_client(config: Config, client: reqwest::Client, dataset: Dataset) -> Self {
        Self {
            config: Arc::new(config),
            client,
            snapshot: Arc::new(RwLock::new(Snapshot {
                generation: 0,
                dataset: Arc::new(dataset),
            })),
            cache: Arc::new(DashMap::new()),
            local_writes: Arc::new(Mutex::new(())),
            reloads: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current snapshot. Holders keep it alive across a concurrent reload.
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// Loads everything again and swaps the snapshot in one step.
    ///
    /// Reloads run one at a time, so a slow load can never publish data
    /// older than a snapshot that was already swapped in.
    pub async fn reload(&self) -> Snapshot {
        let _reloading = self.reloads.lock().await;
        let dataset = Arc::new(load::load_dataset(&self.config, &self.client).await);
        let fresh = {
            let mut current = self.snapshot.write().await;
            *current = Snapshot {
                generation: current.generation + 1,
                dataset,
            };
            current.clone()
        };
        self.cache.clear();
        tracing::info!("Dataset reloaded (generation {}), render cache cleared", fresh.generation);
        fresh
    }

    /// Serialises writers of the local entries file.
    pub async fn append_local_entry(&self, entry: Session) -> Result<usize, LoadError> {
        let _guard = self.local_writes.lock().await;
        load::append_local_entry(&self.config.local_entries_path, entry).await
    }

    pub fn cached_render(&self, key: &RenderKey) -> Option<Vec<u8>> {
        self.cache.get(key).map(|entry| entry.bytes.clone())
    }

    pub fn store_render(&self, key: RenderKey, bytes: Vec<u8>) {
        self.cache.insert(
            key,
            CachedRender {
                bytes,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn evict_expired(&self, ttl: Duration) {
        let now = Instant::now();
        self.cache.retain(|_, cached| now.duration_since(cached.inserted_at) < ttl);
        tracing::info!("Cache eviction complete. Current size: {}", self.cache.len());
    }
}
