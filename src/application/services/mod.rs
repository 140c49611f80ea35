pub mod cache_service;
pub mod connectivity;
pub mod sync_service;

pub use cache_service::CacheService;
pub use connectivity::{ConnectivityBridge, ConnectivityMonitor};
pub use sync_service::{SubmitOutcome, SyncService};
