//! Progress reporting for ingestion.
//!
//! Events are delivered synchronously through an optional callback so the
//! CLI can turn them into log lines or terminal output.

/// Progress events emitted while fetching and synchronizing commits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A page of commits arrived from the remote API.
    FetchedPage {
        /// Page number (1-indexed).
        page: u32,
        /// Number of commits on this page.
        count: usize,
        /// Total pages advertised by the first response (1 if unpaginated).
        total_pages: u32,
    },

    /// All pages were fetched and assembled.
    FetchComplete {
        /// Repository being fetched, as `owner/name`.
        repository: String,
        /// Total number of raw commits.
        total: usize,
    },

    /// Authoring contributors were reconciled against storage.
    ContributorsResolved {
        /// Distinct author names seen in the input.
        distinct: usize,
        /// Contributors newly created.
        created: usize,
        /// Existing contributors whose blank email was filled in.
        backfilled: usize,
    },

    /// Commits were written.
    CommitsPersisted {
        /// Repository written to, as `owner/name`.
        repository: String,
        /// Distinct commits requested.
        requested: usize,
        /// Rows actually inserted (the rest already existed).
        inserted: u64,
    },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
