use commitlog::sync::SyncProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::FetchedPage {
                page,
                count,
                total_pages,
            } => {
                tracing::debug!(page, count, total_pages, "Fetched page");
            }

            SyncProgress::FetchComplete { repository, total } => {
                tracing::info!(repo = %repository, total, "Fetch complete");
            }

            SyncProgress::ContributorsResolved {
                distinct,
                created,
                backfilled,
            } => {
                tracing::info!(distinct, created, backfilled, "Contributors resolved");
            }

            SyncProgress::CommitsPersisted {
                repository,
                requested,
                inserted,
            } => {
                tracing::info!(repo = %repository, requested, inserted, "Commits persisted");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
