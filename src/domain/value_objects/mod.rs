pub mod connectivity;
pub mod entity_kind;
pub mod mutation_action;
pub mod mutation_id;
pub mod remote_id;

pub use connectivity::ConnectivityState;
pub use entity_kind::EntityKind;
pub use mutation_action::MutationAction;
pub use mutation_id::MutationId;
pub use remote_id::RemoteId;
