pub mod cached_entity;
pub mod drain_report;
pub mod pending_mutation;

pub use cached_entity::{CachedEntity, Page};
pub use drain_report::DrainReport;
pub use pending_mutation::{
    MessageWrite, MutationPayload, PendingMutation, PendingMutationDraft, PostWrite, ProfileWrite,
    TripWrite,
};
