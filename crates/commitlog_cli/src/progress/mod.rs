//! Progress reporting for ingestion.
//!
//! Two modes, picked by whether stdout is a terminal:
//! - Interactive mode (TTY): short styled status lines on stderr
//! - Logging mode (non-TTY): structured events through tracing

mod logging;

use std::sync::Arc;

use commitlog::sync::{ProgressCallback, SyncProgress};
use console::{Term, style};

pub use logging::LoggingReporter;

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    Interactive(InteractiveReporter),
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Convert to a callback for the library.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| reporter.handle(event))
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes one status line per event to stderr, keeping stdout for results.
pub struct InteractiveReporter {
    term: Term,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        if let Some(line) = describe(&event) {
            let _ = self.term.write_line(&line);
        }
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(event: &SyncProgress) -> Option<String> {
    match event {
        SyncProgress::FetchedPage {
            page,
            count,
            total_pages,
        } => Some(format!(
            "{} page {}/{} ({} commits)",
            style("fetched").dim(),
            page,
            total_pages,
            count
        )),
        SyncProgress::FetchComplete { repository, total } => Some(format!(
            "{} {} commits from {}",
            style("fetched").green(),
            total,
            style(repository).bold()
        )),
        SyncProgress::ContributorsResolved {
            distinct,
            created,
            backfilled,
        } => Some(format!(
            "{} {} authors ({} new, {} emails filled in)",
            style("resolved").green(),
            distinct,
            created,
            backfilled
        )),
        SyncProgress::CommitsPersisted {
            repository,
            requested,
            inserted,
        } => Some(format!(
            "{} {} new of {} commits in {}",
            style("stored").green(),
            inserted,
            requested,
            style(repository).bold()
        )),
        _ => None,
    }
}
