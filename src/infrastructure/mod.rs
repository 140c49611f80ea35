pub mod database;
pub mod resilience;
