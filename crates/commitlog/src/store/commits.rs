use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entity::commit::{ActiveModel, Column, Entity as Commit, Model};

use super::CHUNK_SIZE;
use super::errors::Result;

/// Optional narrowing for [`find_for_repository`].
///
/// Bounds are inclusive and compared in UTC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitFilter {
    pub author_id: Option<Uuid>,
    pub since: Option<DateTime<FixedOffset>>,
    pub until: Option<DateTime<FixedOffset>>,
}

impl CommitFilter {
    #[must_use]
    pub fn with_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    #[must_use]
    pub fn with_since(mut self, since: DateTime<FixedOffset>) -> Self {
        self.since = Some(to_utc(since));
        self
    }

    #[must_use]
    pub fn with_until(mut self, until: DateTime<FixedOffset>) -> Self {
        self.until = Some(to_utc(until));
        self
    }

    fn apply(&self, query: Select<Commit>) -> Select<Commit> {
        let mut query = query;
        if let Some(author_id) = self.author_id {
            query = query.filter(Column::AuthorId.eq(author_id));
        }
        if let Some(since) = self.since {
            query = query.filter(Column::CommittedAt.gte(to_utc(since)));
        }
        if let Some(until) = self.until {
            query = query.filter(Column::CommittedAt.lte(to_utc(until)));
        }
        query
    }
}

/// Commit timestamps are stored in UTC; bounds must match for comparisons.
fn to_utc(value: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    value.with_timezone(&Utc).fixed_offset()
}

/// Bulk-insert commits, skipping any `(repository_id, sha)` already stored.
///
/// Inserts in chunks of [`CHUNK_SIZE`]. Returns the number of rows actually
/// inserted; skipped rows are neither updated nor reported as errors.
pub async fn insert_many_ignoring_conflicts<C: ConnectionTrait>(
    db: &C,
    models: Vec<ActiveModel>,
) -> Result<u64> {
    let mut inserted = 0u64;
    let mut pending = models.into_iter().peekable();
    while pending.peek().is_some() {
        let chunk: Vec<ActiveModel> = pending.by_ref().take(CHUNK_SIZE).collect();
        inserted += Commit::insert_many(chunk)
            .on_conflict(
                OnConflict::columns([Column::RepositoryId, Column::Sha])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }
    Ok(inserted)
}

/// Find the commits of `repository_id` whose sha is in `shas`. Order is unspecified.
pub async fn find_by_shas<C: ConnectionTrait>(
    db: &C,
    repository_id: Uuid,
    shas: &[String],
) -> Result<Vec<Model>> {
    let mut found = Vec::with_capacity(shas.len());
    for chunk in shas.chunks(CHUNK_SIZE) {
        let rows = Commit::find()
            .filter(Column::RepositoryId.eq(repository_id))
            .filter(Column::Sha.is_in(chunk.iter().cloned()))
            .all(db)
            .await?;
        found.extend(rows);
    }
    Ok(found)
}

/// List the stored commits of a repository, oldest first.
pub async fn find_for_repository<C: ConnectionTrait>(
    db: &C,
    repository_id: Uuid,
    filter: &CommitFilter,
) -> Result<Vec<Model>> {
    let query = Commit::find().filter(Column::RepositoryId.eq(repository_id));
    let rows = filter
        .apply(query)
        .order_by_asc(Column::CommittedAt)
        .order_by_asc(Column::Sha)
        .all(db)
        .await?;
    Ok(rows)
}

/// Count the stored commits of a repository.
pub async fn count_for_repository<C: ConnectionTrait>(db: &C, repository_id: Uuid) -> Result<u64> {
    let count = Commit::find()
        .filter(Column::RepositoryId.eq(repository_id))
        .count(db)
        .await?;
    Ok(count)
}
