use crate::domain::value_objects::{EntityKind, RemoteId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// One equality filter on a remote query.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub equals: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, equals: Value) -> Self {
        Self {
            column: column.into(),
            equals,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    Create,
    Update(RemoteId),
    Delete(RemoteId),
}

/// Boundary to the hosted data service. Reads are idempotent and safe to
/// retry; the drainer accepts duplicate-write risk when retrying
/// mutations.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    async fn query(
        &self,
        collection: EntityKind,
        filters: &[Filter],
    ) -> Result<Vec<Value>, AppError>;

    async fn mutate(
        &self,
        collection: EntityKind,
        op: RemoteOp,
        body: Value,
    ) -> Result<Value, AppError>;
}
