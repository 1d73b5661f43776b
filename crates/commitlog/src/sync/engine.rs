//! The synchronizer: reconciles raw commits against storage.
//!
//! A sync is one database transaction:
//!
//! 1. get-or-create the owning contributor, then the repository
//! 2. stop here if there are no commits
//! 3. resolve authoring contributors, backfilling blank emails and
//!    bulk-creating the unknown ones
//! 4. build commit rows
//! 5. bulk-insert them, skipping `(repository, sha)` pairs already stored
//!
//! The returned list is every requested commit as stored after the insert,
//! whether this call inserted it or it already existed, one entry per
//! distinct sha in first-seen input order.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ActiveValue::Set, ConnectionTrait, TransactionTrait};
use uuid::Uuid;

use super::error::SyncError;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::RepositoryRef;
use crate::entity::commit::{self, CommitPayload};
use crate::entity::{contributor, repository};
use crate::github::RawCommit;
use crate::store::{self, NewContributor, StoreError, contributors};

/// Author dates as the commits endpoint documents them.
const AUTHOR_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Persist `raw_commits` for `repository` and return the stored commits.
///
/// # Errors
/// Any storage failure aborts the transaction; nothing from this call is
/// kept. An unparseable author date fails the whole sync.
pub async fn sync_commits<D: TransactionTrait>(
    db: &D,
    repository: &RepositoryRef,
    raw_commits: &[RawCommit],
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<commit::Model>, SyncError> {
    let txn = db.begin().await?;

    let stored_repository = resolve_repository(&txn, repository).await?;

    if raw_commits.is_empty() {
        txn.commit().await?;
        tracing::debug!(repository = %repository, "No commits to sync");
        return Ok(Vec::new());
    }

    let (authors, stats) = resolve_authors(&txn, raw_commits).await?;
    emit(
        on_progress,
        SyncProgress::ContributorsResolved {
            distinct: authors.len(),
            created: stats.created,
            backfilled: stats.backfilled,
        },
    );

    let (models, shas) = build_commits(stored_repository.id, raw_commits, &authors)?;
    let requested = shas.len();
    let inserted = store::commits::insert_many_ignoring_conflicts(&txn, models).await?;
    let persisted = read_back(&txn, stored_repository.id, &shas).await?;

    txn.commit().await?;

    emit(
        on_progress,
        SyncProgress::CommitsPersisted {
            repository: repository.to_string(),
            requested,
            inserted,
        },
    );
    tracing::info!(
        repository = %repository,
        requested,
        inserted,
        skipped = (requested as u64).saturating_sub(inserted),
        "Synced commits"
    );

    Ok(persisted)
}

async fn resolve_repository<C: ConnectionTrait>(
    db: &C,
    repository: &RepositoryRef,
) -> Result<repository::Model, SyncError> {
    let owner = contributors::get_or_create(db, &repository.owner).await?;
    let stored = store::repositories::get_or_create(db, &repository.name, &owner).await?;
    Ok(stored)
}

#[derive(Debug, Default)]
struct AuthorStats {
    created: usize,
    backfilled: usize,
}

/// Distinct author names in first-seen order, with the email to use for each.
///
/// When a name repeats, the last non-blank email seen wins.
fn collect_authors(raw_commits: &[RawCommit]) -> (Vec<String>, HashMap<String, Option<String>>) {
    let mut names = Vec::new();
    let mut emails: HashMap<String, Option<String>> = HashMap::new();

    for raw in raw_commits {
        let name = raw.author_name();
        let email = raw
            .commit
            .author
            .email
            .clone()
            .filter(|e| !e.trim().is_empty());

        match emails.get_mut(name) {
            Some(slot) => {
                if email.is_some() {
                    *slot = email;
                }
            }
            None => {
                names.push(name.to_string());
                emails.insert(name.to_string(), email);
            }
        }
    }

    (names, emails)
}

async fn resolve_authors<C: ConnectionTrait>(
    db: &C,
    raw_commits: &[RawCommit],
) -> Result<(HashMap<String, contributor::Model>, AuthorStats), SyncError> {
    let (names, mut emails) = collect_authors(raw_commits);
    let mut stats = AuthorStats::default();

    let mut resolved: HashMap<String, contributor::Model> = contributors::find_by_names(db, &names)
        .await?
        .into_iter()
        .map(|c| (c.name.clone(), c))
        .collect();

    let mut staged = Vec::new();
    for name in &names {
        let email = emails.remove(name).flatten();
        match resolved.get_mut(name) {
            Some(existing) => {
                if !existing.has_email()
                    && let Some(email) = email
                    && contributors::backfill_email(db, existing.id, &email).await?
                {
                    tracing::debug!(name = %existing.name, "Backfilled contributor email");
                    existing.email = Some(email);
                    stats.backfilled += 1;
                }
            }
            None => staged.push(NewContributor::new(name.clone(), email)),
        }
    }

    if !staged.is_empty() {
        let staged_names: Vec<String> = staged.iter().map(|c| c.name.clone()).collect();
        stats.created = contributors::insert_many_ignoring_conflicts(db, staged).await? as usize;
        for created in contributors::find_by_names(db, &staged_names).await? {
            resolved.insert(created.name.clone(), created);
        }
    }

    Ok((resolved, stats))
}

/// Build one row per distinct sha, in first-seen order.
fn build_commits(
    repository_id: Uuid,
    raw_commits: &[RawCommit],
    authors: &HashMap<String, contributor::Model>,
) -> Result<(Vec<commit::ActiveModel>, Vec<String>), SyncError> {
    let mut seen = HashSet::new();
    let mut models = Vec::with_capacity(raw_commits.len());
    let mut shas = Vec::with_capacity(raw_commits.len());

    for raw in raw_commits {
        if !seen.insert(raw.sha.as_str()) {
            continue;
        }

        let author = authors
            .get(raw.author_name())
            .ok_or_else(|| SyncError::UnresolvedContributor(raw.author_name().to_string()))?;
        let committed_at = parse_author_date(&raw.sha, &raw.commit.author.date)?;

        models.push(commit::ActiveModel {
            id: Set(Uuid::new_v4()),
            repository_id: Set(repository_id),
            sha: Set(raw.sha.clone()),
            author_id: Set(author.id),
            committed_at: Set(committed_at),
            payload: Set(CommitPayload {
                message: raw.commit.message.clone(),
                url: raw.url.clone(),
            }),
        });
        shas.push(raw.sha.clone());
    }

    Ok((models, shas))
}

/// Load the rows for `shas` and return them in the order of `shas`.
async fn read_back<C: ConnectionTrait>(
    db: &C,
    repository_id: Uuid,
    shas: &[String],
) -> Result<Vec<commit::Model>, SyncError> {
    let mut by_sha: HashMap<String, commit::Model> =
        store::commits::find_by_shas(db, repository_id, shas)
            .await?
            .into_iter()
            .map(|c| (c.sha.clone(), c))
            .collect();

    shas.iter()
        .map(|sha| {
            by_sha.remove(sha).ok_or_else(|| {
                SyncError::Store(StoreError::NotFound {
                    context: format!("commit sha={sha} repository_id={repository_id}"),
                })
            })
        })
        .collect()
}

/// Parse an author date into a UTC timestamp.
pub(crate) fn parse_author_date(
    sha: &str,
    value: &str,
) -> Result<DateTime<FixedOffset>, SyncError> {
    DateTime::parse_from_str(value, AUTHOR_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc).fixed_offset())
        .map_err(|_| SyncError::InvalidTimestamp {
            sha: sha.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{RawAuthor, RawCommitDetails};

    fn raw(sha: &str, name: &str, email: Option<&str>, date: &str) -> RawCommit {
        RawCommit {
            sha: sha.to_string(),
            url: format!("https://api.github.com/repos/o/r/commits/{sha}"),
            commit: RawCommitDetails {
                author: RawAuthor {
                    name: name.to_string(),
                    email: email.map(str::to_string),
                    date: date.to_string(),
                },
                message: format!("message {sha}"),
            },
        }
    }

    #[test]
    fn author_dates_with_numeric_offset_are_normalized_to_utc() {
        let parsed = parse_author_date("abc", "2024-03-01T06:00:00+0200").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T04:00:00+00:00");
    }

    #[test]
    fn author_dates_in_rfc3339_are_accepted() {
        let parsed = parse_author_date("abc", "2024-03-01T06:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T06:00:00+00:00");

        let parsed = parse_author_date("abc", "2024-03-01T06:00:00-05:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T11:00:00+00:00");
    }

    #[test]
    fn unparseable_author_date_names_the_commit() {
        let err = parse_author_date("deadbeef", "yesterday").unwrap_err();
        match err {
            SyncError::InvalidTimestamp { sha, value } => {
                assert_eq!(sha, "deadbeef");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn collect_authors_keeps_first_seen_order_and_last_non_blank_email() {
        let commits = vec![
            raw("1", "alice", Some("old@example.com"), "2024-01-01T00:00:00Z"),
            raw("2", "bob", None, "2024-01-01T00:00:00Z"),
            raw("3", "alice", Some("new@example.com"), "2024-01-01T00:00:00Z"),
            raw("4", "alice", Some(""), "2024-01-01T00:00:00Z"),
        ];

        let (names, emails) = collect_authors(&commits);
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(emails["alice"].as_deref(), Some("new@example.com"));
        assert_eq!(emails["bob"], None);
    }

    #[test]
    fn build_commits_skips_repeated_shas_and_requires_authors() {
        let alice = contributor::Model {
            id: Uuid::new_v4(),
            name: "alice".to_string(),
            email: None,
        };
        let authors = HashMap::from([("alice".to_string(), alice.clone())]);
        let repository_id = Uuid::new_v4();

        let commits = vec![
            raw("a", "alice", None, "2024-01-01T00:00:00Z"),
            raw("b", "alice", None, "2024-01-02T00:00:00Z"),
            raw("a", "alice", None, "2024-01-03T00:00:00Z"),
        ];
        let (models, shas) = build_commits(repository_id, &commits, &authors).unwrap();
        assert_eq!(shas, vec!["a", "b"]);
        assert_eq!(models.len(), 2);

        let orphan = vec![raw("c", "mallory", None, "2024-01-01T00:00:00Z")];
        let err = build_commits(repository_id, &orphan, &authors).unwrap_err();
        assert!(matches!(err, SyncError::UnresolvedContributor(name) if name == "mallory"));
    }
}
