use crate::application::ports::{OfflineStore, RemoteDataService};
use crate::domain::entities::{CachedEntity, Page};
use crate::domain::value_objects::{EntityKind, RemoteId};
use crate::infrastructure::resilience::{retry_with_backoff, CircuitBreaker};
use crate::shared::config::RetryConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Read side of the offline layer: serves cached snapshots and refreshes
/// whole collections from the remote service.
pub struct CacheService {
    store: Arc<dyn OfflineStore>,
    remote: Arc<dyn RemoteDataService>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
}

impl CacheService {
    pub fn new(
        store: Arc<dyn OfflineStore>,
        remote: Arc<dyn RemoteDataService>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            remote,
            breaker,
            retry,
        }
    }

    /// Cached snapshots only; never touches the network.
    pub async fn cached(&self, kind: EntityKind, page: Page) -> Result<Vec<CachedEntity>, AppError> {
        self.store.entities(kind, page).await
    }

    /// Fetch a collection and overwrite the cached snapshots wholesale.
    /// Records without a usable string `id` are skipped with a warning
    /// rather than failing the refresh. Returns the number of snapshots
    /// written.
    pub async fn refresh_collection(
        &self,
        kind: EntityKind,
        cancel: &CancellationToken,
    ) -> Result<u32, AppError> {
        let records = self
            .breaker
            .execute(|| {
                retry_with_backoff(&self.retry, cancel, || self.remote.query(kind, &[]))
            })
            .await?;

        let fetched_at = Utc::now();
        let mut written = 0u32;
        for record in records {
            let Some(remote_id) = extract_id(&record) else {
                warn!(
                    target: "offline::cache",
                    kind = %kind,
                    "remote record without a string id; skipping"
                );
                continue;
            };
            let entity = CachedEntity::new(kind, remote_id, record, fetched_at)
                .map_err(AppError::Validation)?;
            self.store.put_entity(entity).await?;
            written += 1;
        }

        debug!(target: "offline::cache", kind = %kind, written, "collection refreshed");
        Ok(written)
    }

    /// Wipe cached entities and the pending queue (logout/reset).
    pub async fn clear(&self) -> Result<(), AppError> {
        self.store.clear_all().await
    }
}

fn extract_id(record: &Value) -> Option<RemoteId> {
    let id = record.get("id")?.as_str()?;
    RemoteId::new(id.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{Filter, RemoteOp};
    use crate::infrastructure::database::SqliteOfflineStore;
    use crate::shared::config::CircuitBreakerConfig;
    use async_trait::async_trait;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    struct FixedRemote {
        records: Vec<Value>,
    }

    #[async_trait]
    impl RemoteDataService for FixedRemote {
        async fn query(
            &self,
            _collection: EntityKind,
            _filters: &[Filter],
        ) -> Result<Vec<Value>, AppError> {
            Ok(self.records.clone())
        }

        async fn mutate(
            &self,
            _collection: EntityKind,
            _op: RemoteOp,
            _body: Value,
        ) -> Result<Value, AppError> {
            Err(AppError::Internal("not under test".into()))
        }
    }

    async fn service(records: Vec<Value>) -> CacheService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        CacheService::new(
            Arc::new(SqliteOfflineStore::new(pool)),
            Arc::new(FixedRemote { records }),
            Arc::new(CircuitBreaker::new(
                "remote-data",
                CircuitBreakerConfig::default(),
            )),
            RetryConfig {
                max_retries: 1,
                ..RetryConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn refresh_caches_every_well_formed_record() {
        let service = service(vec![
            json!({ "id": "post-1", "title": "Portal axles" }),
            json!({ "id": "post-2", "title": "Tyre pressures" }),
        ])
        .await;

        let written = service
            .refresh_collection(EntityKind::Post, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(written, 2);

        let cached = service.cached(EntityKind::Post, Page::default()).await.unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn records_without_id_are_skipped_not_fatal() {
        let service = service(vec![
            json!({ "title": "no id here" }),
            json!({ "id": 42, "title": "numeric id" }),
            json!({ "id": "post-1", "title": "kept" }),
        ])
        .await;

        let written = service
            .refresh_collection(EntityKind::Post, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let service = service(vec![json!({ "id": "post-1" })]).await;
        service
            .refresh_collection(EntityKind::Post, &CancellationToken::new())
            .await
            .unwrap();

        service.clear().await.unwrap();

        let cached = service.cached(EntityKind::Post, Page::default()).await.unwrap();
        assert!(cached.is_empty());
    }
}
