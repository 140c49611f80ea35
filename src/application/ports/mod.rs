pub mod offline_store;
pub mod remote_gateway;

pub use offline_store::OfflineStore;
pub use remote_gateway::{Filter, RemoteDataService, RemoteOp};
