//! GitHub commit fetching.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for GitHub API operations
//! - [`types`] - Raw commit records and query parameters
//! - [`pagination`] - Link header parsing and page URL derivation
//! - [`client`] - The concurrent paginated fetcher
//!
//! ```ignore
//! use commitlog::github::{CommitQuery, GitHubClient};
//!
//! let client = GitHubClient::new(&token)?;
//! let commits = client
//!     .fetch_commits(&CommitQuery::new("octocat", "Hello-World").with_author("monalisa"))
//!     .await?;
//! ```

mod client;
mod error;
mod pagination;
mod types;

pub use client::{DEFAULT_API_URL, GitHubClient};
pub use error::GitHubError;
pub use pagination::{LinkPagination, extract_page_from_url, parse_link_header, with_page};
pub use types::{CommitQuery, PER_PAGE, RawAuthor, RawCommit, RawCommitDetails, TimeBound};
