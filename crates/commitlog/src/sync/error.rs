use sea_orm::DbErr;
use thiserror::Error;

use crate::github::GitHubError;
use crate::store::StoreError;

/// Errors raised while writing fetched commits to storage.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Beginning or committing the unit of work failed.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Commit {sha} has an unparseable author date: {value:?}")]
    InvalidTimestamp { sha: String, value: String },

    /// A commit names an author that was neither found nor created.
    #[error("No contributor resolved for author {0:?}")]
    UnresolvedContributor(String),
}

/// Errors raised by a full fetch-then-sync ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The remote API failed; nothing was written.
    #[error(transparent)]
    Remote(#[from] GitHubError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
