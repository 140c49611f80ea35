use crate::domain::value_objects::{EntityKind, RemoteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Denormalized snapshot of a remote record, kept for offline display.
/// Always overwritten wholesale on fetch; never partially patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedEntity {
    pub kind: EntityKind,
    pub remote_id: RemoteId,
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CachedEntity {
    pub fn new(
        kind: EntityKind,
        remote_id: RemoteId,
        data: Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        if data.is_null() {
            return Err("Cached entity data cannot be null".to_string());
        }
        Ok(Self {
            kind,
            remote_id,
            data,
            fetched_at,
        })
    }
}

/// Restartable slice of a cached collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}
