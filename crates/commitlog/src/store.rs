//! Storage primitives for contributors, repositories and commits.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`], so the
//! synchronizer can run them inside a single transaction and tests can run
//! them against a plain connection.
//!
//! Lookups return [`Lookup`] instead of folding "fetch or insert" into one
//! call; callers branch on `Found`/`NotFound` explicitly.

pub mod commits;
pub mod contributors;
mod errors;
pub mod repositories;

pub use commits::CommitFilter;
pub use contributors::NewContributor;
pub use errors::{Result, StoreError};

/// Rows per statement for bulk inserts and `IN (...)` lookups.
///
/// Keeps each statement well under SQLite's bound-parameter limit.
pub const CHUNK_SIZE: usize = 100;

/// Outcome of a lookup by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Convert into an `Option`.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::NotFound,
        }
    }
}
