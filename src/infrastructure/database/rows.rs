use crate::domain::entities::{CachedEntity, MutationPayload, PendingMutation};
use crate::domain::value_objects::{EntityKind, MutationAction, MutationId, RemoteId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CachedEntityRow {
    pub entity_kind: String,
    pub remote_id: String,
    pub data: String,
    pub fetched_at: i64,
}

impl TryFrom<CachedEntityRow> for CachedEntity {
    type Error = AppError;

    fn try_from(row: CachedEntityRow) -> Result<Self, Self::Error> {
        let kind = EntityKind::parse(&row.entity_kind).map_err(AppError::Deserialization)?;
        let remote_id = RemoteId::new(row.remote_id).map_err(AppError::Deserialization)?;
        let data = serde_json::from_str(&row.data)
            .map_err(|e| AppError::Deserialization(e.to_string()))?;
        let fetched_at = millis_to_datetime(row.fetched_at)?;
        CachedEntity::new(kind, remote_id, data, fetched_at).map_err(AppError::Deserialization)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PendingMutationRow {
    pub mutation_id: String,
    pub action: String,
    pub payload: String,
    pub attempt_count: i64,
    pub enqueued_at: i64,
}

impl TryFrom<PendingMutationRow> for PendingMutation {
    type Error = AppError;

    fn try_from(row: PendingMutationRow) -> Result<Self, Self::Error> {
        let id = MutationId::new(row.mutation_id).map_err(AppError::Deserialization)?;
        let action = MutationAction::parse(&row.action).map_err(AppError::Deserialization)?;
        let payload: MutationPayload = serde_json::from_str(&row.payload)
            .map_err(|e| AppError::Deserialization(e.to_string()))?;
        let enqueued_at = millis_to_datetime(row.enqueued_at)?;

        Ok(PendingMutation {
            id,
            action,
            payload,
            attempt_count: row.attempt_count.max(0) as u32,
            enqueued_at,
        })
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Deserialization(format!("timestamp out of range: {millis}")))
}
