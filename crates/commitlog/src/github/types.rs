//! Raw commit records and query parameters for the commits endpoint.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Page size requested from the commits endpoint.
pub const PER_PAGE: u32 = 100;

/// A commit as returned by `GET /repos/{owner}/{repo}/commits`, before
/// normalization. Fields the sync does not need are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub url: String,
    pub commit: RawCommitDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommitDetails {
    pub author: RawAuthor,
    pub message: String,
}

/// Git author as recorded in the commit object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAuthor {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// ISO-8601 timestamp with offset, e.g. `2024-03-01T06:00:00Z`.
    pub date: String,
}

impl RawCommit {
    pub fn author_name(&self) -> &str {
        &self.commit.author.name
    }
}

/// A since/until bound, either pre-formatted or a value to normalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeBound {
    /// Passed to the API verbatim.
    Formatted(String),
    /// Midnight UTC of the given day.
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl TimeBound {
    /// ISO-8601 rendering sent as the query parameter.
    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Formatted(s) => s.clone(),
            Self::Date(date) => format!("{}T00:00:00Z", date.format("%Y-%m-%d")),
            Self::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl From<NaiveDate> for TimeBound {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<FixedOffset>> for TimeBound {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<String> for TimeBound {
    fn from(s: String) -> Self {
        Self::Formatted(s)
    }
}

impl From<&str> for TimeBound {
    fn from(s: &str) -> Self {
        Self::Formatted(s.to_string())
    }
}

/// Parameters for one commit-listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitQuery {
    pub owner: String,
    pub repo: String,
    pub author: Option<String>,
    pub since: Option<TimeBound>,
    pub until: Option<TimeBound>,
}

impl CommitQuery {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            author: None,
            since: None,
            until: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn with_since(mut self, since: impl Into<TimeBound>) -> Self {
        self.since = Some(since.into());
        self
    }

    #[must_use]
    pub fn with_until(mut self, until: impl Into<TimeBound>) -> Self {
        self.until = Some(until.into());
        self
    }

    /// Query parameters for a page, absent filters omitted.
    pub fn query_pairs(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(author) = &self.author {
            pairs.push(("author", author.clone()));
        }
        if let Some(since) = &self.since {
            pairs.push(("since", since.to_iso8601()));
        }
        if let Some(until) = &self.until {
            pairs.push(("until", until.to_iso8601()));
        }
        pairs.push(("per_page", PER_PAGE.to_string()));
        pairs.push(("page", page.to_string()));
        pairs
    }
}
