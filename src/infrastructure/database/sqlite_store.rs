use super::connection::DbPool;
use super::rows::{CachedEntityRow, PendingMutationRow};
use crate::application::ports::OfflineStore;
use crate::domain::entities::{CachedEntity, Page, PendingMutation, PendingMutationDraft};
use crate::domain::value_objects::{EntityKind, MutationId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;

/// SQLite-backed implementation of the offline store. One row per cached
/// snapshot keyed by `(entity_kind, remote_id)`; queue order comes from
/// the `seq` rowid, never from timestamps.
pub struct SqliteOfflineStore {
    pool: DbPool,
}

impl SqliteOfflineStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn pending_count(&self) -> Result<u32, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_mutations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u32)
    }
}

#[async_trait]
impl OfflineStore for SqliteOfflineStore {
    async fn put_entity(&self, entity: CachedEntity) -> Result<(), AppError> {
        let data = serde_json::to_string(&entity.data)?;

        sqlx::query(
            r#"
            INSERT INTO cached_entities (entity_kind, remote_id, data, fetched_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (entity_kind, remote_id)
            DO UPDATE SET data = excluded.data, fetched_at = excluded.fetched_at
            "#,
        )
        .bind(entity.kind.as_str())
        .bind(entity.remote_id.as_str())
        .bind(data)
        .bind(entity.fetched_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn entities(&self, kind: EntityKind, page: Page) -> Result<Vec<CachedEntity>, AppError> {
        let rows: Vec<CachedEntityRow> = sqlx::query_as(
            r#"
            SELECT entity_kind, remote_id, data, fetched_at
            FROM cached_entities
            WHERE entity_kind = ?
            ORDER BY fetched_at DESC, remote_id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(kind.as_str())
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CachedEntity::try_from).collect()
    }

    async fn enqueue_mutation(
        &self,
        draft: PendingMutationDraft,
    ) -> Result<PendingMutation, AppError> {
        let mutation = PendingMutation::from_draft(draft, Utc::now());
        let payload = serde_json::to_string(&mutation.payload)?;

        sqlx::query(
            r#"
            INSERT INTO pending_mutations (mutation_id, action, payload, attempt_count, enqueued_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(mutation.id.as_str())
        .bind(mutation.action.as_str())
        .bind(payload)
        .bind(i64::from(mutation.attempt_count))
        .bind(mutation.enqueued_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(mutation)
    }

    async fn pending_mutations(&self) -> Result<Vec<PendingMutation>, AppError> {
        let rows: Vec<PendingMutationRow> = sqlx::query_as(
            r#"
            SELECT mutation_id, action, payload, attempt_count, enqueued_at
            FROM pending_mutations
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PendingMutation::try_from).collect()
    }

    async fn remove_mutation(&self, id: &MutationId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM pending_mutations WHERE mutation_id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn bump_attempts(&self, id: &MutationId, new_count: u32) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE pending_mutations SET attempt_count = ? WHERE mutation_id = ?",
        )
        .bind(i64::from(new_count))
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("pending mutation {id}")));
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM pending_mutations")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cached_entities")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// SQLITE_FULL (code 13) means the device ran out of space; surface it as
/// a storage failure rather than a generic database error.
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        if code.as_deref() == Some("13")
            || db_err.message().contains("database or disk is full")
        {
            return AppError::Storage(db_err.message().to_string());
        }
    }
    AppError::Database(err.to_string())
}
