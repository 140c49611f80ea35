use thiserror::Error;

/// Postgres SQLSTATE classes that indicate a lost or refused connection
/// rather than a bad request. These are safe to retry.
const CONNECTION_SQLSTATES: &[&str] = &["08000", "08003", "08006", "57P01"];

/// HTTP statuses treated as transient upstream failures.
const RETRYABLE_STATUSES: &[u16] = &[503, 504, 522, 524];

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Remote service returned status {status}: {message}")]
    RemoteStatus { status: u16, message: String },

    #[error("Remote service error {code}: {message}")]
    RemoteCode { code: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Circuit open for dependency '{dependency}'")]
    CircuitOpen { dependency: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transient errors that a retry loop may attempt again. Everything
    /// else is fatal and must be propagated on the first attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => true,
            AppError::RemoteStatus { status, .. } => RETRYABLE_STATUSES.contains(status),
            AppError::RemoteCode { code, .. } => {
                CONNECTION_SQLSTATES.contains(&code.as_str())
            }
            _ => false,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, AppError::CircuitOpen { .. })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
