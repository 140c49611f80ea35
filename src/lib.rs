//! Offline-resilience core for the Unimog Community Hub client.
//!
//! Keeps a SQLite-backed cache of remote entities and a durable queue of
//! pending mutations, replays the queue through a retry/backoff wrapper
//! and a circuit breaker, and reacts to connectivity transitions.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{Filter, OfflineStore, RemoteDataService, RemoteOp};
pub use application::services::{
    CacheService, ConnectivityBridge, ConnectivityMonitor, SubmitOutcome, SyncService,
};
pub use domain::entities::{
    CachedEntity, DrainReport, MutationPayload, Page, PendingMutation, PendingMutationDraft,
};
pub use domain::value_objects::{
    ConnectivityState, EntityKind, MutationAction, MutationId, RemoteId,
};
pub use infrastructure::database::{Database, SqliteOfflineStore};
pub use infrastructure::resilience::{retry_with_backoff, CircuitBreaker, CircuitState};
pub use shared::{AppError, OfflineConfig, Result};

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wired-up offline layer: one database pool, one breaker, and the
/// services that share them. All collaborators are injected here rather
/// than reached through globals, so independent hubs never share state.
pub struct OfflineHub {
    store: Arc<SqliteOfflineStore>,
    sync: Arc<SyncService>,
    cache: Arc<CacheService>,
    monitor: ConnectivityMonitor,
    bridge: Arc<ConnectivityBridge>,
}

impl OfflineHub {
    /// Open (and migrate) the local database and wire the services
    /// around the given remote gateway. `collections` are refreshed on
    /// every reconnect.
    pub async fn initialize(
        config: OfflineConfig,
        remote: Arc<dyn RemoteDataService>,
        collections: Vec<EntityKind>,
    ) -> Result<Self> {
        config.validate().map_err(AppError::Configuration)?;

        let pool = Database::initialize(&config.database).await?;
        let store = Arc::new(SqliteOfflineStore::new(pool));
        let breaker = Arc::new(CircuitBreaker::new("remote-data", config.breaker.clone()));

        let sync = Arc::new(SyncService::new(
            store.clone(),
            remote.clone(),
            breaker.clone(),
            config.retry.clone(),
            config.sync.clone(),
        ));
        let cache = Arc::new(CacheService::new(
            store.clone(),
            remote,
            breaker,
            config.retry.clone(),
        ));
        let monitor = ConnectivityMonitor::new(ConnectivityState::Online);
        let bridge = Arc::new(ConnectivityBridge::new(
            sync.clone(),
            cache.clone(),
            collections,
        ));

        Ok(Self {
            store,
            sync,
            cache,
            monitor,
            bridge,
        })
    }

    /// Spawn the connectivity bridge; it runs until the token fires.
    pub fn start(&self, cancel: CancellationToken) -> JoinHandle<()> {
        self.bridge.spawn(self.monitor.subscribe(), cancel)
    }

    pub fn store(&self) -> &Arc<SqliteOfflineStore> {
        &self.store
    }

    pub fn sync(&self) -> &Arc<SyncService> {
        &self.sync
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    pub fn is_degraded(&self) -> bool {
        self.bridge.is_degraded()
    }
}
