use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn unauthorized(msg: impl Into<String>) -> Self { Self::Unauthorized(msg.into()) }

    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::NotFound(_) => 1002,
            ServiceError::Unauthorized(_) => 1003,
            ServiceError::Conflict(_) => 1004,
            ServiceError::Storage(_) => 1200,
        }
    }
}
