use crate::db::error::DbError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// ServiceError represents errors that can occur in the service layer of the application.
///
/// Wraps lower-level errors to provide a consistent error handling mechanism across the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("entity not found: {entity}")]
    NotFound { entity: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DbError),
}
