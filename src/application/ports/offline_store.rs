use crate::domain::entities::{CachedEntity, Page, PendingMutation, PendingMutationDraft};
use crate::domain::value_objects::{EntityKind, MutationId};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Per-client durable storage: cached entity snapshots plus the
/// pending-mutation queue. Survives restarts independent of network
/// state.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// Upsert a snapshot by `(kind, remote_id)`. The only expected
    /// failure is the storage layer itself (e.g. quota), surfaced as
    /// `AppError::Storage`.
    async fn put_entity(&self, entity: CachedEntity) -> Result<(), AppError>;

    /// Recency-sorted slice of a cached collection.
    async fn entities(&self, kind: EntityKind, page: Page) -> Result<Vec<CachedEntity>, AppError>;

    /// Append a mutation with attempt count zero.
    async fn enqueue_mutation(
        &self,
        draft: PendingMutationDraft,
    ) -> Result<PendingMutation, AppError>;

    /// Every queued mutation, in insertion order.
    async fn pending_mutations(&self) -> Result<Vec<PendingMutation>, AppError>;

    async fn remove_mutation(&self, id: &MutationId) -> Result<(), AppError>;

    async fn bump_attempts(&self, id: &MutationId, new_count: u32) -> Result<(), AppError>;

    /// Wipe every store; used for logout/reset.
    async fn clear_all(&self) -> Result<(), AppError>;
}
