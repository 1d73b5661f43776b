//! Synchronization of fetched commits into storage.
//!
//! # Module Structure
//!
//! - [`types`] - `RepositoryRef` and `IngestRequest`
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - The transactional synchronizer: `sync_commits()`
//! - [`ingest`] - Fetch then sync: `ingest()`
//!
//! # Example
//!
//! ```ignore
//! use commitlog::github::GitHubClient;
//! use commitlog::sync::{IngestRequest, ingest};
//!
//! let client = GitHubClient::new(&token)?;
//! let request = IngestRequest::new("octocat", "Hello-World").with_since("2024-01-01T00:00:00Z");
//! let commits = ingest(&client, &db, &request, None).await?;
//! ```

pub mod engine;
mod error;
pub mod ingest;
mod progress;
mod types;

pub use engine::sync_commits;
pub use error::{IngestError, SyncError};
pub use ingest::ingest;
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{IngestRequest, RepositoryRef};
