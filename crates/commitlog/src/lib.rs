//! Commitlog - commit history ingestion for GitHub repositories.
//!
//! Commits are fetched from the GitHub commits endpoint (every page,
//! concurrently, reassembled in page order) and written into a relational
//! store where contributors, repositories and commits are each unique by
//! their natural key. Re-ingesting the same history is a no-op.
//!
//! # Features
//!
//! - `github` - Enables the reqwest-backed HTTP transport and
//!   [`github::GitHubClient::new`].
//! - `sqlite` / `postgres` - Database drivers.
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to create the schema on connection.
//!
//! # Example
//!
//! ```ignore
//! use commitlog::github::GitHubClient;
//! use commitlog::sync::{IngestRequest, ingest};
//!
//! let db = commitlog::connect_and_migrate("sqlite://commitlog.db?mode=rwc").await?;
//! let client = GitHubClient::new(&token)?;
//!
//! let commits = ingest(&client, &db, &IngestRequest::new("rust-lang", "rust"), None).await?;
//! ```

pub mod db;
pub mod entity;
pub mod github;
pub mod http;
pub mod report;
pub mod store;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use store::StoreError;
