use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use stagelytics_core::store::{Dataset, DatasetStore, DatasetSummary};

use crate::{config::Config, error::AppError};

/// Datasets held in process memory, oldest upload first.
///
/// Re-uploading an existing id replaces its events in place without changing
/// its eviction position.
pub struct MemoryDatasetStore {
    datasets: RwLock<VecDeque<Arc<Dataset>>>,
    capacity: usize,
}

impl MemoryDatasetStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            datasets: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl DatasetStore for MemoryDatasetStore {
    async fn put(&self, dataset: Dataset) -> anyhow::Result<Vec<String>> {
        let mut datasets = self.datasets.write().await;
        if let Some(slot) = datasets.iter_mut().find(|d| d.id == dataset.id) {
            *slot = Arc::new(dataset);
            return Ok(Vec::new());
        }
        datasets.push_back(Arc::new(dataset));
        let mut evicted = Vec::new();
        while datasets.len() > self.capacity {
            if let Some(old) = datasets.pop_front() {
                evicted.push(old.id.clone());
            }
        }
        Ok(evicted)
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Arc<Dataset>>> {
        let datasets = self.datasets.read().await;
        Ok(datasets.iter().find(|d| d.id == id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<DatasetSummary>> {
        let datasets = self.datasets.read().await;
        Ok(datasets.iter().map(|d| d.summary()).collect())
    }

    async fn remove(&self, id: &str) -> anyhow::Result<bool> {
        let mut datasets = self.datasets.write().await;
        let before = datasets.len();
        datasets.retain(|d| d.id != id);
        Ok(datasets.len() != before)
    }
}

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
    pub datasets: Arc<dyn DatasetStore>,
}

impl AppState {
    /// In-memory store sized from `config.max_datasets`.
    pub fn new(config: Config) -> Self {
        let store = MemoryDatasetStore::new(config.max_datasets);
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: Config, datasets: Arc<dyn DatasetStore>) -> Self {
        Self {
            config: Arc::new(config),
            datasets,
        }
    }

    pub async fn dataset(&self, id: &str) -> Result<Arc<Dataset>, AppError> {
        self.datasets
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Dataset not found".to_string()))
    }

    pub async fn store_dataset(&self, dataset: Dataset) -> Result<DatasetSummary, AppError> {
        let summary = dataset.summary();
        let evicted = self.datasets.put(dataset).await?;
        if !evicted.is_empty() {
            info!(?evicted, "evicted oldest datasets to stay under the cap");
        }
        Ok(summary)
    }
}
