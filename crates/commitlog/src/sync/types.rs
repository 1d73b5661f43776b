//! Request types for ingestion.

use std::fmt;

use crate::github::{CommitQuery, TimeBound};

/// A repository as named by the caller: its owner's login and its name.
///
/// The owner is the repository owner, which may differ from every commit
/// author.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One ingestion: which repository, and which slice of its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub repository: RepositoryRef,
    /// Remote author login filter.
    pub author: Option<String>,
    pub since: Option<TimeBound>,
    pub until: Option<TimeBound>,
}

impl IngestRequest {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repository: RepositoryRef::new(owner, name),
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

    /// The remote query this request issues.
    pub fn commit_query(&self) -> CommitQuery {
        CommitQuery {
            owner: self.repository.owner.clone(),
            repo: self.repository.name.clone(),
            author: self.author.clone(),
            since: self.since.clone(),
            until: self.until.clone(),
        }
    }
}
