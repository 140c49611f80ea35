use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of entity kinds the offline layer caches and syncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Post,
    Message,
    Trip,
    Profile,
    Knowledge,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Post => "post",
            EntityKind::Message => "message",
            EntityKind::Trip => "trip",
            EntityKind::Profile => "profile",
            EntityKind::Knowledge => "knowledge",
        }
    }

    /// Remote collection name backing this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Post => "posts",
            EntityKind::Message => "messages",
            EntityKind::Trip => "trips",
            EntityKind::Profile => "profiles",
            EntityKind::Knowledge => "knowledge_snippets",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "post" => Ok(EntityKind::Post),
            "message" => Ok(EntityKind::Message),
            "trip" => Ok(EntityKind::Trip),
            "profile" => Ok(EntityKind::Profile),
            "knowledge" => Ok(EntityKind::Knowledge),
            other => Err(format!("Unknown entity kind: {other}")),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
