//! Wiring: config → store → mock registry → backend → client → services

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

use crate::client::{ApiClient, ApiError, Backend, HttpTransport, MockBackend, MockRegistry, RequestCache};
use crate::config::{ClientMode, Config, MockStoreKind};
use crate::jobcards::{self, JobCardService};
use crate::leads::{self, LeadConversionListener};
use crate::store::{FjallStore, MemoryStore, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to open record store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build transport: {0}")]
    Transport(#[from] ApiError),
}

/// Registry with every mock route installed against `store`
pub fn mock_registry(store: Arc<dyn RecordStore>) -> MockRegistry {
    let mut registry = MockRegistry::new();
    jobcards::mock::install(&mut registry, store.clone());
    leads::mock::install(&mut registry, store);
    registry
}

pub fn open_store(config: &Config) -> Result<Arc<dyn RecordStore>, StoreError> {
    let store: Arc<dyn RecordStore> = match config.mock.store {
        MockStoreKind::Memory => Arc::new(MemoryStore::new()),
        MockStoreKind::Fjall => Arc::new(FjallStore::open(&config.mock.store_path)?),
    };
    info!(store = store.name(), "Record store ready");
    Ok(store)
}

/// Fully wired client side of the application
#[derive(Clone)]
pub struct App {
    pub client: ApiClient,
    pub jobcards: JobCardService,
    pub leads: LeadConversionListener,
}

impl App {
    pub fn build(config: &Config) -> Result<Self, AppError> {
        let backend: Arc<dyn Backend> = match config.client.mode {
            ClientMode::Mock => {
                let registry = mock_registry(open_store(config)?);
                Arc::new(MockBackend::new(registry).with_latency(config.mock.latency.as_duration()))
            }
            ClientMode::Http => Arc::new(HttpTransport::new(config.client.http_settings())?),
        };

        Ok(Self::with_backend(backend, config))
    }

    /// Wire around an existing backend
    pub fn with_backend(backend: Arc<dyn Backend>, config: &Config) -> Self {
        info!(backend = backend.name(), "Building API client");

        let client = ApiClient::new(backend, Arc::new(RequestCache::new()), config.client.defaults());
        let jobcards = JobCardService::new(client.clone());
        let leads = LeadConversionListener::new(client.clone());

        Self {
            client,
            jobcards,
            leads,
        }
    }

    /// Start converting leads on job card completion. Must be called from
    /// within a tokio runtime.
    pub fn spawn_listeners(&self) -> JoinHandle<()> {
        self.leads.clone().spawn(self.jobcards.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::config::HumanDuration;
    use crate::routes::RouteId;
    use tempfile::TempDir;

    #[test]
    fn test_registry_covers_catalogue() {
        let registry = mock_registry(Arc::new(MemoryStore::new()));
        for route in RouteId::ALL {
            assert!(registry.has_handler(route.method(), route.pattern()), "{}", route);
        }
        assert_eq!(registry.len(), RouteId::ALL.len());
        assert!(!registry.has_handler(Method::Delete, "/leads/:id"));
    }

    #[tokio::test]
    async fn test_build_mock_mode() {
        let app = App::build(&Config::default()).unwrap();
        assert_eq!(app.client.backend_name(), "mock");
    }

    #[tokio::test]
    async fn test_build_fjall_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.mock.store = MockStoreKind::Fjall;
        config.mock.store_path = temp_dir.path().join("mock");
        config.mock.latency = HumanDuration::from_millis(1);

        let app = App::build(&config).unwrap();
        assert_eq!(app.client.backend_name(), "mock");
        assert!(app.jobcards.list(None).await.unwrap().is_empty());
    }

    #[test]
    fn test_build_http_mode() {
        let mut config = Config::default();
        config.client.mode = ClientMode::Http;

        let app = App::build(&config).unwrap();
        assert_eq!(app.client.backend_name(), "http");
    }
}
