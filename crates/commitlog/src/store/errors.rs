use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A row that must exist could not be read back.
    #[error("Record not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a NotFound error for a contributor name lookup.
    pub fn contributor_not_found(name: &str) -> Self {
        Self::NotFound {
            context: format!("contributor name={name}"),
        }
    }

    /// Create a NotFound error for a repository natural key lookup.
    pub fn repository_not_found(name: &str, owner_id: Uuid) -> Self {
        Self::NotFound {
            context: format!("repository name={name} owner_id={owner_id}"),
        }
    }

    pub(crate) fn blank(field: &str) -> Self {
        Self::InvalidInput {
            message: format!("{field} must not be empty"),
        }
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
