pub mod connection;
pub mod rows;
pub mod sqlite_store;

pub use connection::{Database, DbPool};
pub use sqlite_store::SqliteOfflineStore;
