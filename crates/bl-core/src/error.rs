//! # AppError
//!
//! Centralized error handling for the Rusty-Blog crates.
//! A denied mutation is not an error; see [`crate::authorization`].

use thiserror::Error;

/// The primary error type for all bl-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Post, Comment, Category, User)
    #[error("{0} not found with key {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., title too long, unknown category)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, key: impl ToString) -> Self {
        Self::NotFound(entity.to_string(), key.to_string())
    }
}

/// Stores may wrap an `AppError` in their `anyhow` result; it is passed
/// through unchanged. Anything else is an internal failure.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(err) => Self::Internal(format!("{err:#}")),
        }
    }
}

/// A specialized Result type for Rusty-Blog logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_not_found_survives_anyhow() {
        let err: anyhow::Error = AppError::not_found("Post", 7).into();
        assert!(matches!(AppError::from(err), AppError::NotFound(entity, key) if entity == "Post" && key == "7"));
    }

    #[test]
    fn other_failures_become_internal() {
        let err = AppError::from(anyhow::anyhow!("disk full"));
        assert!(matches!(err, AppError::Internal(msg) if msg == "disk full"));
    }
}
