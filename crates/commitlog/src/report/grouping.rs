//! Grouping of commits by author, then by UTC calendar date.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::entity::commit;
use crate::store::{self, StoreError};

/// Per-commit projection shown in a date bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitView {
    pub sha: String,
    pub message: String,
    pub url: String,
}

impl From<&commit::Model> for CommitView {
    fn from(model: &commit::Model) -> Self {
        Self {
            sha: model.sha.clone(),
            message: model.payload.message.clone(),
            url: model.payload.url.clone(),
        }
    }
}

/// One contributor and their commits bucketed by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorGroup {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Dates serialize as `YYYY-MM-DD` keys.
    pub commits: BTreeMap<NaiveDate, Vec<CommitView>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorsReport {
    /// Contributors in order of their first commit in the input.
    pub authors: Vec<AuthorGroup>,
    /// Every date covered, ascending and distinct.
    pub dates: Vec<NaiveDate>,
}

/// Group `commits` by authoring contributor, then by UTC date.
///
/// Within a bucket, commits keep their input order.
///
/// # Errors
/// Fails if an author row cannot be loaded.
pub async fn build_report<C: ConnectionTrait>(
    db: &C,
    commits: &[commit::Model],
) -> Result<AuthorsReport, StoreError> {
    let author_ids: Vec<Uuid> = commits.iter().map(|c| c.author_id).collect();
    let contributors: HashMap<Uuid, _> = store::contributors::find_by_ids(db, &author_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut authors: Vec<AuthorGroup> = Vec::new();
    let mut position: HashMap<Uuid, usize> = HashMap::new();
    let mut dates = BTreeSet::new();

    for commit in commits {
        let index = match position.get(&commit.author_id) {
            Some(index) => *index,
            None => {
                let contributor = contributors.get(&commit.author_id).ok_or_else(|| {
                    StoreError::NotFound {
                        context: format!("contributor id={}", commit.author_id),
                    }
                })?;
                authors.push(AuthorGroup {
                    id: contributor.id,
                    name: contributor.name.clone(),
                    email: contributor.email.clone(),
                    commits: BTreeMap::new(),
                });
                position.insert(commit.author_id, authors.len() - 1);
                authors.len() - 1
            }
        };

        let date = commit.date();
        dates.insert(date);
        authors[index]
            .commits
            .entry(date)
            .or_default()
            .push(CommitView::from(commit));
    }

    Ok(AuthorsReport {
        authors,
        dates: dates.into_iter().collect(),
    })
}
