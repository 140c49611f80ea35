use crate::domain::value_objects::{EntityKind, MutationAction, MutationId, RemoteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Write shape for a post: the subset of columns the client may send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub recipient: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_model: Option<String>,
}

/// Closed union of deferred-write payloads. The drainer matches on this
/// exhaustively, so adding a variant forces every dispatch site to handle
/// it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "entity", content = "data", rename_all = "snake_case")]
pub enum MutationPayload {
    Post(PostWrite),
    Message(MessageWrite),
    Trip(TripWrite),
    Profile(ProfileWrite),
}

impl MutationPayload {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            MutationPayload::Post(_) => EntityKind::Post,
            MutationPayload::Message(_) => EntityKind::Message,
            MutationPayload::Trip(_) => EntityKind::Trip,
            MutationPayload::Profile(_) => EntityKind::Profile,
        }
    }

    pub fn remote_id(&self) -> Option<&RemoteId> {
        match self {
            MutationPayload::Post(write) => write.id.as_ref(),
            MutationPayload::Message(write) => write.id.as_ref(),
            MutationPayload::Trip(write) => write.id.as_ref(),
            MutationPayload::Profile(write) => write.id.as_ref(),
        }
    }
}

/// Input for enqueueing a deferred write; the store assigns the id,
/// timestamp and attempt count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingMutationDraft {
    pub action: MutationAction,
    pub payload: MutationPayload,
}

impl PendingMutationDraft {
    pub fn new(action: MutationAction, payload: MutationPayload) -> Result<Self, String> {
        match action {
            MutationAction::Update | MutationAction::Delete => {
                if payload.remote_id().is_none() {
                    return Err(format!(
                        "{} mutation requires a remote id in its payload",
                        action
                    ));
                }
            }
            MutationAction::Create => {}
        }
        Ok(Self { action, payload })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingMutation {
    pub id: MutationId,
    pub action: MutationAction,
    pub payload: MutationPayload,
    pub attempt_count: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingMutation {
    pub fn from_draft(draft: PendingMutationDraft, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id: MutationId::generate(),
            action: draft.action,
            payload: draft.payload,
            attempt_count: 0,
            enqueued_at,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        self.payload.entity_kind()
    }
}
