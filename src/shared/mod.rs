pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::OfflineConfig;
pub use error::{AppError, Result};
